//! In-memory [`Store`] implementation for testing.
//!
//! Rows live in `Vec`s behind a single `std::sync::RwLock`. Ids are assigned
//! from per-table counters starting at 1, mirroring SQLite rowids.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Movie, MovieWithSources, NewMovie, NewReview, NewSource, Review, Source};

use super::{Store, StoreCounts};

#[derive(Default)]
struct Tables {
    movies: Vec<Movie>,
    sources: Vec<Source>,
    reviews: Vec<Review>,
    next_movie_id: i64,
    next_source_id: i64,
    next_review_id: i64,
}

impl Tables {
    fn with_sources(&self, movie: &Movie) -> MovieWithSources {
        let mut sources: Vec<Source> = self
            .sources
            .iter()
            .filter(|s| s.movie_id == movie.id)
            .cloned()
            .collect();
        sources.sort_by_key(|s| s.id);
        MovieWithSources {
            movie: movie.clone(),
            sources,
        }
    }

    fn select_movies(&self, pred: impl Fn(&Movie) -> bool) -> Vec<MovieWithSources> {
        let mut out: Vec<MovieWithSources> = self
            .movies
            .iter()
            .filter(|m| pred(m))
            .map(|m| self.with_sources(m))
            .collect();
        out.sort_by_key(|m| m.movie.id);
        out
    }
}

/// In-memory store for tests.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_movie(&self, movie: &NewMovie) -> Result<Movie> {
        let mut t = self.write()?;
        t.next_movie_id += 1;
        let row = Movie {
            id: t.next_movie_id,
            title: movie.title.clone(),
            release_date: movie.release_date,
            created_at: now_ts(),
        };
        t.movies.push(row.clone());
        Ok(row)
    }

    async fn update_release_date(
        &self,
        movie_id: i64,
        release_date: Option<NaiveDate>,
    ) -> Result<()> {
        let mut t = self.write()?;
        match t.movies.iter_mut().find(|m| m.id == movie_id) {
            Some(m) => {
                m.release_date = release_date;
                Ok(())
            }
            None => bail!("movie {} not found", movie_id),
        }
    }

    async fn movies_by_title(&self, title: &str) -> Result<Vec<MovieWithSources>> {
        let needle = title.to_lowercase();
        let t = self.read()?;
        Ok(t.select_movies(|m| m.title.to_lowercase() == needle))
    }

    async fn search_movies(&self, fragment: &str) -> Result<Vec<MovieWithSources>> {
        let needle = fragment.to_lowercase();
        let t = self.read()?;
        Ok(t.select_movies(|m| m.title.to_lowercase().contains(&needle)))
    }

    async fn list_movies(&self) -> Result<Vec<MovieWithSources>> {
        let t = self.read()?;
        Ok(t.select_movies(|_| true))
    }

    async fn get_or_create_source(&self, source: &NewSource) -> Result<(Source, bool)> {
        let mut t = self.write()?;
        if !t.movies.iter().any(|m| m.id == source.movie_id) {
            bail!("movie {} not found", source.movie_id);
        }
        if let Some(existing) = t.sources.iter().find(|s| {
            s.movie_id == source.movie_id && s.site == source.site && s.url == source.url
        }) {
            return Ok((existing.clone(), false));
        }
        t.next_source_id += 1;
        let row = Source {
            id: t.next_source_id,
            movie_id: source.movie_id,
            site: source.site,
            url: source.url.clone(),
            created_at: now_ts(),
        };
        t.sources.push(row.clone());
        Ok((row, true))
    }

    async fn reviews_for_source(&self, source_id: i64) -> Result<Vec<Review>> {
        let t = self.read()?;
        let mut reviews: Vec<Review> = t
            .reviews
            .iter()
            .filter(|r| r.source_id == source_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn get_or_create_review(&self, review: &NewReview) -> Result<(Review, bool)> {
        let mut t = self.write()?;
        if !t.sources.iter().any(|s| s.id == review.source_id) {
            bail!("source {} not found", review.source_id);
        }
        if let Some(existing) = t.reviews.iter().find(|r| review.matches(r)) {
            return Ok((existing.clone(), false));
        }
        t.next_review_id += 1;
        let row = Review {
            id: t.next_review_id,
            source_id: review.source_id,
            audience_score: review.audience_score,
            audience_count: review.audience_count.clone(),
            critic_score: review.critic_score,
            critic_count: review.critic_count.clone(),
            created_at: now_ts(),
        };
        t.reviews.push(row.clone());
        Ok((row, true))
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let t = self.read()?;
        Ok(StoreCounts {
            movies: t.movies.len() as i64,
            sources: t.sources.len() as i64,
            reviews: t.reviews.len() as i64,
        })
    }
}
