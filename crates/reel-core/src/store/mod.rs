//! Storage abstraction for Reel.
//!
//! The [`Store`] trait defines every persistence operation the
//! reconciliation core needs, enabling pluggable backends (SQLite in the
//! `reel` crate, [`memory::InMemoryStore`] for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Movie, MovieWithSources, NewMovie, NewReview, NewSource, Review, Source};

pub use crate::models::StoreCounts;

/// Abstract entity store.
///
/// Get-or-create operations return the row together with `true` when it
/// was inserted by this call, `false` when an identical row already existed.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_movie`](Store::insert_movie) | Create a movie, returning it with its new id |
/// | [`update_release_date`](Store::update_release_date) | Overwrite a movie's release date |
/// | [`movies_by_title`](Store::movies_by_title) | Case-insensitive exact title lookup |
/// | [`search_movies`](Store::search_movies) | Case-insensitive substring title lookup |
/// | [`list_movies`](Store::list_movies) | Every movie with its sources |
/// | [`get_or_create_source`](Store::get_or_create_source) | Idempotent source insert keyed on (site, url, movie) |
/// | [`reviews_for_source`](Store::reviews_for_source) | Reviews of one source, oldest first |
/// | [`get_or_create_review`](Store::get_or_create_review) | Idempotent review insert keyed on the full tuple |
/// | [`counts`](Store::counts) | Row counts |
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_movie(&self, movie: &NewMovie) -> Result<Movie>;

    async fn update_release_date(
        &self,
        movie_id: i64,
        release_date: Option<NaiveDate>,
    ) -> Result<()>;

    /// Movies whose title equals `title` ignoring case, id ascending, with
    /// sources prefetched.
    async fn movies_by_title(&self, title: &str) -> Result<Vec<MovieWithSources>>;

    /// Movies whose title contains `fragment` ignoring case, id ascending.
    async fn search_movies(&self, fragment: &str) -> Result<Vec<MovieWithSources>>;

    /// All movies, id ascending, with sources prefetched.
    async fn list_movies(&self) -> Result<Vec<MovieWithSources>>;

    async fn get_or_create_source(&self, source: &NewSource) -> Result<(Source, bool)>;

    async fn reviews_for_source(&self, source_id: i64) -> Result<Vec<Review>>;

    async fn get_or_create_review(&self, review: &NewReview) -> Result<(Review, bool)>;

    async fn counts(&self) -> Result<StoreCounts>;
}
