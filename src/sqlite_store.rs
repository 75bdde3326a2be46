//! SQLite-backed [`Store`] implementation.
//!
//! Case-insensitive title comparison uses `COLLATE NOCASE` / `LIKE`, which
//! fold ASCII letters only. Review tuple lookups compare with `IS` so that
//! NULL matches NULL.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use reel_core::models::StoreCounts;
use reel_core::store::Store;
use reel_core::{Movie, MovieWithSources, NewMovie, NewReview, NewSource, Review, Site, Source};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn with_sources(&self, movies: Vec<Movie>) -> Result<Vec<MovieWithSources>> {
        let mut out = Vec::with_capacity(movies.len());
        for movie in movies {
            let rows = sqlx::query(
                "SELECT id, movie_id, site, url, created_at FROM sources WHERE movie_id = ? ORDER BY id",
            )
            .bind(movie.id)
            .fetch_all(&self.pool)
            .await?;
            let sources = rows.iter().map(source_from_row).collect::<Result<Vec<_>>>()?;
            out.push(MovieWithSources { movie, sources });
        }
        Ok(out)
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        release_date: row.try_get::<Option<NaiveDate>, _>("release_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn source_from_row(row: &SqliteRow) -> Result<Source> {
    let site: String = row.try_get("site")?;
    Ok(Source {
        id: row.try_get("id")?,
        movie_id: row.try_get("movie_id")?,
        site: site.parse::<Site>()?,
        url: row.try_get("url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    Ok(Review {
        id: row.try_get("id")?,
        source_id: row.try_get("source_id")?,
        audience_score: row.try_get("audience_score")?,
        audience_count: row.try_get("audience_count")?,
        critic_score: row.try_get("critic_score")?,
        critic_count: row.try_get("critic_count")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Escape `LIKE` wildcards so a fragment matches literally.
fn escape_like(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_movie(&self, movie: &NewMovie) -> Result<Movie> {
        let created_at = now_ts();
        let result =
            sqlx::query("INSERT INTO movies (title, release_date, created_at) VALUES (?, ?, ?)")
                .bind(&movie.title)
                .bind(movie.release_date)
                .bind(created_at)
                .execute(&self.pool)
                .await?;

        Ok(Movie {
            id: result.last_insert_rowid(),
            title: movie.title.clone(),
            release_date: movie.release_date,
            created_at,
        })
    }

    async fn update_release_date(
        &self,
        movie_id: i64,
        release_date: Option<NaiveDate>,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE movies SET release_date = ? WHERE id = ?")
            .bind(release_date)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("movie {} not found", movie_id);
        }
        Ok(())
    }

    async fn movies_by_title(&self, title: &str) -> Result<Vec<MovieWithSources>> {
        let rows = sqlx::query(
            "SELECT id, title, release_date, created_at FROM movies WHERE title = ? COLLATE NOCASE ORDER BY id",
        )
        .bind(title)
        .fetch_all(&self.pool)
        .await?;
        let movies = rows.iter().map(movie_from_row).collect::<Result<Vec<_>>>()?;
        self.with_sources(movies).await
    }

    async fn search_movies(&self, fragment: &str) -> Result<Vec<MovieWithSources>> {
        let pattern = format!("%{}%", escape_like(fragment));
        let rows = sqlx::query(
            r#"SELECT id, title, release_date, created_at FROM movies
               WHERE title LIKE ? ESCAPE '\' ORDER BY id"#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        let movies = rows.iter().map(movie_from_row).collect::<Result<Vec<_>>>()?;
        self.with_sources(movies).await
    }

    async fn list_movies(&self) -> Result<Vec<MovieWithSources>> {
        let movie_rows =
            sqlx::query("SELECT id, title, release_date, created_at FROM movies ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        let source_rows =
            sqlx::query("SELECT id, movie_id, site, url, created_at FROM sources ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut by_movie: HashMap<i64, Vec<Source>> = HashMap::new();
        for row in &source_rows {
            let source = source_from_row(row)?;
            by_movie.entry(source.movie_id).or_default().push(source);
        }

        movie_rows
            .iter()
            .map(|row| {
                let movie = movie_from_row(row)?;
                let sources = by_movie.remove(&movie.id).unwrap_or_default();
                Ok(MovieWithSources { movie, sources })
            })
            .collect()
    }

    async fn get_or_create_source(&self, source: &NewSource) -> Result<(Source, bool)> {
        let result = sqlx::query(
            r#"
            INSERT INTO sources (movie_id, site, url, created_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(movie_id, site, url) DO NOTHING
            "#,
        )
        .bind(source.movie_id)
        .bind(source.site.as_str())
        .bind(&source.url)
        .bind(now_ts())
        .execute(&self.pool)
        .await?;
        let created = result.rows_affected() == 1;

        let row = sqlx::query(
            "SELECT id, movie_id, site, url, created_at FROM sources WHERE movie_id = ? AND site = ? AND url = ?",
        )
        .bind(source.movie_id)
        .bind(source.site.as_str())
        .bind(&source.url)
        .fetch_one(&self.pool)
        .await?;

        Ok((source_from_row(&row)?, created))
    }

    async fn reviews_for_source(&self, source_id: i64) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"SELECT id, source_id, audience_score, audience_count, critic_score, critic_count, created_at
               FROM reviews WHERE source_id = ? ORDER BY id"#,
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn get_or_create_review(&self, review: &NewReview) -> Result<(Review, bool)> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            r#"
            SELECT id, source_id, audience_score, audience_count, critic_score, critic_count, created_at
            FROM reviews
            WHERE source_id = ?
              AND audience_score IS ?
              AND audience_count IS ?
              AND critic_score IS ?
              AND critic_count IS ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(review.source_id)
        .bind(review.audience_score)
        .bind(&review.audience_count)
        .bind(review.critic_score)
        .bind(&review.critic_count)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok((review_from_row(&row)?, false));
        }

        let created_at = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (source_id, audience_score, audience_count, critic_score, critic_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(review.source_id)
        .bind(review.audience_score)
        .bind(&review.audience_count)
        .bind(review.critic_score)
        .bind(&review.critic_count)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok((
            Review {
                id: result.last_insert_rowid(),
                source_id: review.source_id,
                audience_score: review.audience_score,
                audience_count: review.audience_count.clone(),
                critic_score: review.critic_score,
                critic_count: review.critic_count.clone(),
                created_at,
            },
            true,
        ))
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let movies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        let sources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources")
            .fetch_one(&self.pool)
            .await?;
        let reviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.pool)
            .await?;
        Ok(StoreCounts {
            movies,
            sources,
            reviews,
        })
    }
}
