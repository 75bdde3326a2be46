//! Title matching: locate the stored movie an incoming record refers to.

use anyhow::Result;
use tracing::debug;

use crate::models::{Movie, MovieWithSources, SourceRecord};
use crate::store::Store;

/// Find the stored movie whose title equals `title` ignoring case.
///
/// When several stored movies share the title, the one with the lowest id
/// is returned.
pub async fn find_match(store: &dyn Store, title: &str) -> Result<Option<MovieWithSources>> {
    let candidates = store.movies_by_title(title).await?;
    if candidates.len() > 1 {
        debug!(
            title,
            matches = candidates.len(),
            "ambiguous title, using lowest id"
        );
    }
    Ok(candidates.into_iter().min_by_key(|m| m.movie.id))
}

/// Identity equality between a stored movie and an incoming record:
/// case-sensitive title and exact release date, both-absent included.
pub fn same_movie(stored: &Movie, incoming: &SourceRecord) -> bool {
    stored.title == incoming.title && stored.release_date == incoming.release_date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMovie, Site, SourceRef};
    use crate::store::memory::InMemoryStore;
    use chrono::NaiveDate;

    fn record(title: &str, date: Option<NaiveDate>) -> SourceRecord {
        SourceRecord {
            title: title.into(),
            release_date: date,
            source: SourceRef::new(Site::Imdb, "http://x"),
        }
    }

    #[tokio::test]
    async fn finds_case_insensitive_title() {
        let store = InMemoryStore::new();
        store
            .insert_movie(&NewMovie {
                title: "The Holdovers".into(),
                release_date: None,
            })
            .await
            .unwrap();

        let found = find_match(&store, "the holdovers").await.unwrap();
        assert_eq!(found.unwrap().movie.title, "The Holdovers");
        assert!(find_match(&store, "Holdovers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ambiguous_titles_resolve_to_lowest_id() {
        let store = InMemoryStore::new();
        for year in [2021, 1984] {
            store
                .insert_movie(&NewMovie {
                    title: "Dune".into(),
                    release_date: NaiveDate::from_ymd_opt(year, 1, 1),
                })
                .await
                .unwrap();
        }
        let found = find_match(&store, "Dune").await.unwrap().unwrap();
        assert_eq!(found.movie.id, 1);
    }

    #[test]
    fn same_movie_is_strict() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1);
        let stored = Movie {
            id: 1,
            title: "Dune".into(),
            release_date: d,
            created_at: 0,
        };
        assert!(same_movie(&stored, &record("Dune", d)));
        assert!(!same_movie(&stored, &record("DUNE", d)));
        assert!(!same_movie(&stored, &record("Dune", None)));

        let undated = Movie {
            release_date: None,
            ..stored
        };
        assert!(same_movie(&undated, &record("Dune", None)));
    }
}
