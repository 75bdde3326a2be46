//! Database schema migrations (idempotent).

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index if missing.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            release_date TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // (movie_id, site, url) is the get-or-create key. A site may hold more
    // than one row per movie when its URL changes between runs.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            movie_id INTEGER NOT NULL,
            site TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(movie_id, site, url),
            FOREIGN KEY (movie_id) REFERENCES movies(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Reviews are append-only; no uniqueness constraint because NULLs never
    // compare equal in SQLite UNIQUE indexes. Tuple dedup is done in the store.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id INTEGER NOT NULL,
            audience_score INTEGER,
            audience_count TEXT,
            critic_score INTEGER,
            critic_count TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (source_id) REFERENCES sources(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title COLLATE NOCASE)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sources_movie_id ON sources(movie_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reviews_source_id ON reviews(source_id)")
        .execute(pool)
        .await?;

    Ok(())
}
