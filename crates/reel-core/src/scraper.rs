//! Scraper traits consumed by the orchestrator.
//!
//! Site-specific implementations live in the `reel` crate and are selected
//! by a static registration list, not runtime discovery.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{MovieWithSources, NewSource, ReviewCandidate, Site, SourceRecord};

/// Produces movie candidates from a site's listing page(s).
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use reel_core::{ListScraper, Site, SourceRecord, SourceRef};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl ListScraper for Fixed {
///     fn site(&self) -> Site { Site::Imdb }
///
///     async fn run(&self) -> Result<Vec<SourceRecord>> {
///         Ok(vec![SourceRecord {
///             title: "Dune".into(),
///             release_date: None,
///             source: SourceRef::new(Site::Imdb, "https://www.imdb.com/title/tt1160419/"),
///         }])
///     }
/// }
/// ```
#[async_trait]
pub trait ListScraper: Send + Sync {
    /// The site every returned record's source belongs to.
    fn site(&self) -> Site;

    /// Label used in logs and progress output.
    fn name(&self) -> String {
        format!("{}:list", self.site())
    }

    /// Fetch and parse the listing.
    ///
    /// Individual parse failures must not fail the call; return the records
    /// that could be parsed. An `Err` is reserved for the scraper being
    /// unable to run at all.
    async fn run(&self) -> Result<Vec<SourceRecord>>;
}

/// Scrapes ratings for movies that carry a link to the scraper's site, and
/// looks up links for movies that do not.
#[async_trait]
pub trait ReviewScraper: Send + Sync {
    fn site(&self) -> Site;

    fn name(&self) -> String {
        format!("{}:reviews", self.site())
    }

    /// Scrape one review candidate per movie that has a source for
    /// [`site`](ReviewScraper::site). Movies without one, or whose page
    /// fails to fetch, are absent from the output.
    async fn run(&self, movies: &[MovieWithSources]) -> Result<Vec<ReviewCandidate>>;

    /// Search the site for each movie and return the links found.
    /// Movies that cannot be resolved are omitted.
    async fn get_sources(&self, movies: &[MovieWithSources]) -> Result<Vec<NewSource>>;
}
