//! `reel movies`: print stored movies with their links and latest ratings.

use anyhow::Result;

use reel_core::store::Store;
use reel_core::{MovieWithSources, Review};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// List movies, optionally filtered by a case-insensitive title fragment.
pub async fn list_movies(config: &Config, title: Option<&str>, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let mut movies = match title {
        Some(fragment) => store.search_movies(fragment).await?,
        None => store.list_movies().await?,
    };
    if let Some(limit) = limit {
        movies.truncate(limit);
    }

    if movies.is_empty() {
        println!("No movies found.");
    }

    for movie in &movies {
        println!("{}", movie_heading(movie));
        for source in &movie.sources {
            let reviews = store.reviews_for_source(source.id).await?;
            let latest = reviews
                .last()
                .map(format_review)
                .unwrap_or_else(|| "no ratings".to_string());
            println!("    {:<14} {}", source.site.as_str(), latest);
            println!("    {:<14} {}", "", source.url);
        }
    }

    pool.close().await;
    Ok(())
}

fn movie_heading(movie: &MovieWithSources) -> String {
    match movie.movie.release_date {
        Some(date) => format!("[{}] {} ({})", movie.id(), movie.movie.title, date),
        None => format!("[{}] {}", movie.id(), movie.movie.title),
    }
}

/// "audience 95 (5,000+)  critic 88 (312 Reviews)"; absent fields print `-`.
fn format_review(review: &Review) -> String {
    let side = |score: Option<i64>, count: &Option<String>| {
        let score = score.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        match count.as_deref() {
            Some(c) if !c.is_empty() => format!("{} ({})", score, c),
            _ => score,
        }
    };
    format!(
        "audience {}  critic {}",
        side(review.audience_score, &review.audience_count),
        side(review.critic_score, &review.critic_count)
    )
}
