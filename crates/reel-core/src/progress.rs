//! Pipeline stages and progress events.
//!
//! The orchestrator reports what it is doing through an injected
//! [`PipelineReporter`]. Concrete reporters (stderr, JSON lines) live in the
//! `reel` crate; [`NoProgress`] is the silent default.

use std::fmt;

use serde::Serialize;

/// The four strictly ordered stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// List scrapers run concurrently.
    Discover,
    /// Source records are matched and merged one at a time.
    ReconcileMovies,
    /// Movies lacking a site's link get one looked up.
    FillSources,
    /// Review scrapers run concurrently and results are saved.
    ReconcileReviews,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::ReconcileMovies => "reconcile-movies",
            Stage::FillSources => "fill-sources",
            Stage::ReconcileReviews => "reconcile-reviews",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress event emitted by the orchestrator.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted {
        stage: Stage,
    },
    /// A scraper finished; `items` is zero when it failed.
    ScraperFinished {
        stage: Stage,
        scraper: String,
        items: usize,
        ok: bool,
    },
    /// `n` of `total` records processed in a sequential stage.
    Processed {
        stage: Stage,
        n: u64,
        total: u64,
    },
    StageFinished {
        stage: Stage,
    },
}

/// Receives progress events. Implementations must not block.
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent);
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl PipelineReporter for NoProgress {
    fn report(&self, _event: PipelineEvent) {}
}
