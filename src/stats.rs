//! Database statistics overview.
//!
//! Summarizes what has been collected: movie, source and review counts, and a
//! per-site breakdown. Used by `reel stats` to confirm that runs are landing.

use anyhow::Result;
use sqlx::Row;

use reel_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Per-site breakdown of sources and reviews.
struct SiteStats {
    site: String,
    movie_count: i64,
    source_count: i64,
    review_count: i64,
    last_review_ts: Option<i64>,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let counts = SqliteStore::new(pool.clone()).counts().await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("reel: database stats");
    println!("====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Movies:      {}", counts.movies);
    println!("  Sources:     {}", counts.sources);
    println!("  Reviews:     {}", counts.reviews);

    let rows = sqlx::query(
        r#"
        SELECT
            s.site,
            COUNT(DISTINCT s.movie_id) AS movie_count,
            COUNT(DISTINCT s.id) AS source_count,
            COUNT(r.id) AS review_count,
            MAX(r.created_at) AS last_review_ts
        FROM sources s
        LEFT JOIN reviews r ON r.source_id = s.id
        GROUP BY s.site
        ORDER BY s.site
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let site_stats: Vec<SiteStats> = rows
        .iter()
        .map(|row| SiteStats {
            site: row.get("site"),
            movie_count: row.get("movie_count"),
            source_count: row.get("source_count"),
            review_count: row.get("review_count"),
            last_review_ts: row.get("last_review_ts"),
        })
        .collect();

    if !site_stats.is_empty() {
        println!();
        println!("  By site:");
        println!(
            "  {:<16} {:>7} {:>8} {:>8}   {}",
            "SITE", "MOVIES", "SOURCES", "REVIEWS", "LAST REVIEW"
        );
        println!("  {}", "-".repeat(64));

        for s in &site_stats {
            let last = match s.last_review_ts {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<16} {:>7} {:>8} {:>8}   {}",
                s.site, s.movie_count, s.source_count, s.review_count, last
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
pub(crate) fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn relative_timestamps() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 3 * 3600), "3 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
        assert_eq!(format_ts_relative(0), "1970-01-01 00:00");
    }
}
