//! Typed errors raised by the reconciliation core.

use std::fmt;

use thiserror::Error;

use crate::progress::Stage;

/// A scraper that returned an error during a fan-out stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperFailure {
    pub scraper: String,
    pub message: String,
}

impl fmt::Display for ScraperFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scraper, self.message)
    }
}

/// Errors specific to reconciliation. Store and I/O failures travel as
/// plain `anyhow::Error`.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A review was about to be persisted without an owning source.
    #[error("review candidate has no source id (movie id: {movie_id:?})")]
    MissingSourceId { movie_id: Option<i64> },

    /// One or more scrapers failed; siblings were allowed to finish first.
    #[error("{} scraper(s) failed during {stage}: {}", .failures.len(), join_failures(.failures))]
    ScrapersFailed {
        stage: Stage,
        failures: Vec<ScraperFailure>,
    },

    /// A site name outside the known set.
    #[error("unknown site: '{0}'. Known sites: rottentomatoes, imdb, boxofficemojo")]
    UnknownSite(String),
}

fn join_failures(failures: &[ScraperFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
