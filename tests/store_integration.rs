//! `SqliteStore` behavior against a real database file.

use chrono::NaiveDate;
use tempfile::TempDir;

use reel::config::Config;
use reel::db;
use reel::migrate;
use reel::sqlite_store::SqliteStore;
use reel_core::filter::{save_review, SaveOutcome};
use reel_core::merge::reconcile_record;
use reel_core::store::Store;
use reel_core::{NewMovie, NewReview, NewSource, ReviewCandidate, Site, SourceRecord, SourceRef};

async fn setup() -> (TempDir, SqliteStore) {
    let tmp = TempDir::new().unwrap();
    let config = Config::minimal(tmp.path().join("data").join("reel.sqlite"));
    let pool = db::connect(&config).await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();
    (tmp, SqliteStore::new(pool))
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn record(title: &str, release_date: Option<NaiveDate>, site: Site, url: &str) -> SourceRecord {
    SourceRecord {
        title: title.to_string(),
        release_date,
        source: SourceRef::new(site, url),
    }
}

#[tokio::test]
async fn schema_is_idempotent() {
    let (_tmp, store) = setup().await;
    migrate::apply_schema(store.pool()).await.unwrap();
    assert_eq!(store.counts().await.unwrap().movies, 0);
}

#[tokio::test]
async fn title_lookup_ignores_case_and_orders_by_id() {
    let (_tmp, store) = setup().await;
    let first = store
        .insert_movie(&NewMovie {
            title: "Dune".into(),
            release_date: None,
        })
        .await
        .unwrap();
    store
        .insert_movie(&NewMovie {
            title: "DUNE".into(),
            release_date: date(2021, 10, 22),
        })
        .await
        .unwrap();

    let found = store.movies_by_title("dune").await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].id(), first.id);
    assert!(found[0].movie.id < found[1].movie.id);
    assert_eq!(found[1].movie.release_date, date(2021, 10, 22));

    assert!(store.movies_by_title("dun").await.unwrap().is_empty());
    assert_eq!(store.search_movies("UN").await.unwrap().len(), 2);
    assert!(store.search_movies("%").await.unwrap().is_empty());
}

#[tokio::test]
async fn source_get_or_create_dedups() {
    let (_tmp, store) = setup().await;
    let movie = store
        .insert_movie(&NewMovie {
            title: "Dune".into(),
            release_date: None,
        })
        .await
        .unwrap();
    let new = NewSource {
        movie_id: movie.id,
        site: Site::Imdb,
        url: "https://www.imdb.com/title/tt1/".into(),
    };

    let (a, created_a) = store.get_or_create_source(&new).await.unwrap();
    let (b, created_b) = store.get_or_create_source(&new).await.unwrap();
    assert!(created_a);
    assert!(!created_b);
    assert_eq!(a, b);

    let listed = store.list_movies().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].sources, vec![a]);
}

#[tokio::test]
async fn source_for_missing_movie_fails() {
    let (_tmp, store) = setup().await;
    let result = store
        .get_or_create_source(&NewSource {
            movie_id: 999,
            site: Site::Imdb,
            url: "https://www.imdb.com/title/tt1/".into(),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn review_tuple_matches_nulls() {
    let (_tmp, store) = setup().await;
    let movie = store
        .insert_movie(&NewMovie {
            title: "Dune".into(),
            release_date: None,
        })
        .await
        .unwrap();
    let (source, _) = store
        .get_or_create_source(&NewSource {
            movie_id: movie.id,
            site: Site::RottenTomatoes,
            url: "https://www.rottentomatoes.com/m/dune".into(),
        })
        .await
        .unwrap();

    let review = NewReview {
        source_id: source.id,
        audience_score: None,
        audience_count: None,
        critic_score: Some(88),
        critic_count: None,
    };
    let (first, created) = store.get_or_create_review(&review).await.unwrap();
    assert!(created);
    let (again, created) = store.get_or_create_review(&review).await.unwrap();
    assert!(!created);
    assert_eq!(first.id, again.id);

    let changed = NewReview {
        audience_score: Some(91),
        ..review
    };
    let (_, created) = store.get_or_create_review(&changed).await.unwrap();
    assert!(created);
    assert_eq!(store.reviews_for_source(source.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn scenario_a_new_movie() {
    let (_tmp, store) = setup().await;
    let outcome = reconcile_record(
        &store,
        &record("Dune", date(2024, 3, 1), Site::RottenTomatoes, "http://x/dune"),
    )
    .await
    .unwrap();

    assert!(outcome.movie_created);
    let movies = store.list_movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].movie.release_date, date(2024, 3, 1));
    assert_eq!(movies[0].sources.len(), 1);
    assert_eq!(movies[0].sources[0].url, "http://x/dune");
}

#[tokio::test]
async fn scenario_b_release_date_update() {
    let (_tmp, store) = setup().await;
    reconcile_record(
        &store,
        &record("Dune", date(2024, 3, 1), Site::RottenTomatoes, "http://x/dune"),
    )
    .await
    .unwrap();

    let outcome = reconcile_record(
        &store,
        &record("dune", date(2024, 3, 8), Site::RottenTomatoes, "http://x/dune"),
    )
    .await
    .unwrap();

    assert!(outcome.release_date_updated);
    assert!(!outcome.source_created);
    let movies = store.list_movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].movie.title, "Dune");
    assert_eq!(movies[0].movie.release_date, date(2024, 3, 8));
    assert_eq!(movies[0].sources.len(), 1);
}

#[tokio::test]
async fn scenario_c_second_site_attaches() {
    let (_tmp, store) = setup().await;
    reconcile_record(
        &store,
        &record("Dune", date(2024, 3, 1), Site::RottenTomatoes, "http://x/dune"),
    )
    .await
    .unwrap();

    let outcome = reconcile_record(
        &store,
        &record("Dune", date(2024, 3, 1), Site::Imdb, "http://y/dune"),
    )
    .await
    .unwrap();

    assert!(!outcome.movie_created);
    assert!(!outcome.release_date_updated);
    assert!(outcome.source_created);
    let movies = store.list_movies().await.unwrap();
    assert_eq!(movies.len(), 1);
    let sites: Vec<(Site, &str)> = movies[0]
        .sources
        .iter()
        .map(|s| (s.site, s.url.as_str()))
        .collect();
    assert_eq!(
        sites,
        vec![
            (Site::RottenTomatoes, "http://x/dune"),
            (Site::Imdb, "http://y/dune")
        ]
    );
}

#[tokio::test]
async fn scenario_d_review_save_filter() {
    let (_tmp, store) = setup().await;
    reconcile_record(
        &store,
        &record("Dune", None, Site::RottenTomatoes, "http://x/dune"),
    )
    .await
    .unwrap();
    let source_id = store.list_movies().await.unwrap()[0].sources[0].id;

    let empty = ReviewCandidate {
        source_id: Some(source_id),
        ..Default::default()
    };
    assert_eq!(
        save_review(&store, &empty).await.unwrap(),
        SaveOutcome::Skipped
    );

    let scored = ReviewCandidate {
        source_id: Some(source_id),
        critic_score: Some(88),
        ..Default::default()
    };
    assert!(matches!(
        save_review(&store, &scored).await.unwrap(),
        SaveOutcome::Created(_)
    ));
    assert!(matches!(
        save_review(&store, &scored).await.unwrap(),
        SaveOutcome::Existing(_)
    ));
    assert_eq!(store.counts().await.unwrap().reviews, 1);
}

#[tokio::test]
async fn reconciling_twice_creates_nothing_new() {
    let (_tmp, store) = setup().await;
    let records = vec![
        record("Dune", date(2024, 3, 1), Site::RottenTomatoes, "http://x/dune"),
        record("Wicked", None, Site::RottenTomatoes, "http://x/wicked"),
        record("DUNE", None, Site::Imdb, "http://y/dune"),
    ];

    for r in &records {
        reconcile_record(&store, r).await.unwrap();
    }
    let before = store.counts().await.unwrap();
    for r in &records {
        let outcome = reconcile_record(&store, r).await.unwrap();
        assert!(outcome.is_noop(), "{:?} changed the store", r);
    }
    let after = store.counts().await.unwrap();

    assert_eq!(before, after);
    assert_eq!(after.movies, 2);
    assert_eq!(after.sources, 3);
    let dune = &store.movies_by_title("dune").await.unwrap()[0];
    assert_eq!(dune.movie.release_date, date(2024, 3, 1));
}
