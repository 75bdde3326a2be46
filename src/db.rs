//! SQLite database connection management.
//!
//! Provides a connection pool with WAL mode and foreign keys enabled. The
//! database file and its parent directories are created automatically if
//! they don't exist.
//!
//! Foreign keys must be on for every connection so that deleting a movie
//! cascades to its sources and their reviews.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Create a connection pool to the configured SQLite database.
///
/// # Errors
///
/// Returns an error if the database cannot be created or connected to.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    Ok(pool)
}
