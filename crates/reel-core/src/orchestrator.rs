//! Pipeline orchestration.
//!
//! A run is four strictly ordered stages:
//!
//! | Stage | Work | Concurrency |
//! |-------|------|-------------|
//! | [`Discover`](Stage::Discover) | every list scraper | one future per scraper, joined |
//! | [`ReconcileMovies`](Stage::ReconcileMovies) | match + merge each record | sequential |
//! | [`FillSources`](Stage::FillSources) | backfill missing site links | sequential per site |
//! | [`ReconcileReviews`](Stage::ReconcileReviews) | every review scraper, then save | one future per scraper, joined |
//!
//! Fan-out uses `join_all` inside the caller's task: scrapers interleave
//! at their I/O suspension points on one thread, and nothing here spawns.
//! A failing scraper does not cancel its siblings; all failures of a stage
//! are reported together once every scraper has finished.

use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn, Instrument, Span};

use crate::error::{ReconcileError, ScraperFailure};
use crate::filter::{save_review, SaveOutcome};
use crate::merge::reconcile_record;
use crate::models::{ReviewCandidate, SourceRecord};
use crate::progress::{NoProgress, PipelineEvent, PipelineReporter, Stage};
use crate::resolver::fill_missing_sources;
use crate::scraper::{ListScraper, ReviewScraper};
use crate::store::Store;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records_discovered: u64,
    pub movies_created: u64,
    pub movies_updated: u64,
    pub movies_unchanged: u64,
    pub sources_created: u64,
    pub sources_backfilled: u64,
    pub review_candidates: u64,
    pub reviews_created: u64,
    pub reviews_unchanged: u64,
    pub reviews_skipped: u64,
    pub reviews_rejected: u64,
}

/// Drives one pipeline run over a store and a static set of scrapers.
pub struct Orchestrator<'a> {
    store: &'a dyn Store,
    list_scrapers: &'a [Box<dyn ListScraper>],
    review_scrapers: &'a [Box<dyn ReviewScraper>],
    reporter: &'a dyn PipelineReporter,
    span: Span,
    skip_reviews: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        store: &'a dyn Store,
        list_scrapers: &'a [Box<dyn ListScraper>],
        review_scrapers: &'a [Box<dyn ReviewScraper>],
    ) -> Self {
        Self {
            store,
            list_scrapers,
            review_scrapers,
            reporter: &NoProgress,
            span: Span::none(),
            skip_reviews: false,
        }
    }

    /// Report progress events to `reporter`.
    pub fn with_reporter(mut self, reporter: &'a dyn PipelineReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Parent span for every event logged during the run.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Stop after [`Stage::FillSources`].
    pub fn skip_reviews(mut self, skip: bool) -> Self {
        self.skip_reviews = skip;
        self
    }

    /// Run all stages in order.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let span = self.span.clone();
        async move {
            let mut summary = RunSummary::default();

            let records = self.discover().await?;
            summary.records_discovered = records.len() as u64;

            self.reconcile_movies(&records, &mut summary).await?;
            self.fill_sources(&mut summary).await?;
            if !self.skip_reviews {
                self.reconcile_reviews(&mut summary).await?;
            }

            info!(?summary, "pipeline run finished");
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Stage A: run every list scraper and flatten their output in
    /// registration order.
    pub async fn discover(&self) -> Result<Vec<SourceRecord>> {
        let stage = Stage::Discover;
        self.reporter.report(PipelineEvent::StageStarted { stage });

        let runs = self.list_scrapers.iter().map(|scraper| async move {
            let result = scraper.run().await;
            self.report_scraper(stage, scraper.name(), result.as_ref().map(Vec::len));
            (scraper.name(), result)
        });
        let results = join_all(runs).await;

        let records = collect_stage(stage, results)?;
        self.reporter.report(PipelineEvent::StageFinished { stage });
        Ok(records)
    }

    /// Stage B: fold each record into the store, one at a time.
    ///
    /// This loop must stay sequential. Two records for the same new title
    /// processed concurrently would both miss in the matcher and both take
    /// the create branch. The `&mut self` receiver keeps a second pass from
    /// overlapping on the same orchestrator.
    pub async fn reconcile_movies(
        &mut self,
        records: &[SourceRecord],
        summary: &mut RunSummary,
    ) -> Result<()> {
        let stage = Stage::ReconcileMovies;
        self.reporter.report(PipelineEvent::StageStarted { stage });

        let total = records.len() as u64;
        for (i, record) in records.iter().enumerate() {
            let outcome = reconcile_record(self.store, record).await?;
            if outcome.movie_created {
                summary.movies_created += 1;
            } else if outcome.release_date_updated {
                summary.movies_updated += 1;
            } else {
                summary.movies_unchanged += 1;
            }
            if outcome.source_created {
                summary.sources_created += 1;
            }
            self.reporter.report(PipelineEvent::Processed {
                stage,
                n: i as u64 + 1,
                total,
            });
        }

        self.reporter.report(PipelineEvent::StageFinished { stage });
        Ok(())
    }

    /// Stage C: for each review site not covered by every movie, look up
    /// and attach the missing links.
    pub async fn fill_sources(&self, summary: &mut RunSummary) -> Result<()> {
        let stage = Stage::FillSources;
        self.reporter.report(PipelineEvent::StageStarted { stage });

        let movies = self.store.list_movies().await?;
        for scraper in self.review_scrapers {
            let site = scraper.site();
            if movies.iter().all(|m| m.has_site(site)) {
                continue;
            }
            let created = fill_missing_sources(self.store, &movies, scraper.as_ref()).await?;
            summary.sources_backfilled += created.len() as u64;
            self.report_scraper(stage, scraper.name(), Ok(created.len()));
        }

        self.reporter.report(PipelineEvent::StageFinished { stage });
        Ok(())
    }

    /// Stage D: run every review scraper over the current movie set and
    /// save the save-worthy candidates.
    pub async fn reconcile_reviews(&self, summary: &mut RunSummary) -> Result<()> {
        let stage = Stage::ReconcileReviews;
        self.reporter.report(PipelineEvent::StageStarted { stage });

        let movies = self.store.list_movies().await?;
        let movies = movies.as_slice();
        let runs = self.review_scrapers.iter().map(|scraper| async move {
            let result = scraper.run(movies).await;
            self.report_scraper(stage, scraper.name(), result.as_ref().map(Vec::len));
            (scraper.name(), result)
        });
        let results = join_all(runs).await;
        let candidates: Vec<ReviewCandidate> = collect_stage(stage, results)?;

        summary.review_candidates = candidates.len() as u64;
        let total = summary.review_candidates;
        for (i, candidate) in candidates.iter().enumerate() {
            match save_review(self.store, candidate).await {
                Ok(SaveOutcome::Created(_)) => summary.reviews_created += 1,
                Ok(SaveOutcome::Existing(_)) => summary.reviews_unchanged += 1,
                Ok(SaveOutcome::Skipped) => summary.reviews_skipped += 1,
                Err(e) => match e.downcast_ref::<ReconcileError>() {
                    Some(ReconcileError::MissingSourceId { movie_id }) => {
                        warn!(?movie_id, "rejected review without source");
                        summary.reviews_rejected += 1;
                    }
                    _ => return Err(e),
                },
            }
            self.reporter.report(PipelineEvent::Processed {
                stage,
                n: i as u64 + 1,
                total,
            });
        }

        self.reporter.report(PipelineEvent::StageFinished { stage });
        Ok(())
    }

    fn report_scraper(&self, stage: Stage, scraper: String, result: Result<usize, &anyhow::Error>) {
        let (items, ok) = match result {
            Ok(n) => (n, true),
            Err(e) => {
                warn!(%stage, %scraper, error = %e, "scraper failed");
                (0, false)
            }
        };
        self.reporter.report(PipelineEvent::ScraperFinished {
            stage,
            scraper,
            items,
            ok,
        });
    }
}

/// Flatten per-scraper results, or fail with every error at once.
fn collect_stage<T>(stage: Stage, results: Vec<(String, Result<Vec<T>>)>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut failures = Vec::new();
    for (scraper, result) in results {
        match result {
            Ok(batch) => items.extend(batch),
            Err(e) => failures.push(ScraperFailure {
                scraper,
                message: format!("{:#}", e),
            }),
        }
    }
    if failures.is_empty() {
        Ok(items)
    } else {
        Err(ReconcileError::ScrapersFailed { stage, failures }.into())
    }
}
