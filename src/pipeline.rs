//! `reel run`: wire config, store, fetcher and scrapers into one
//! [`Orchestrator`] run and print its summary.
//!
//! ```text
//! ScraperRegistry ──▶ Orchestrator ──▶ SqliteStore
//!   (from config)     stages A-D       (movies/sources/reviews)
//! ```

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info_span;
use uuid::Uuid;

use reel_core::store::memory::InMemoryStore;
use reel_core::{Orchestrator, RunSummary, SourceRecord};

use crate::config::Config;
use crate::db;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::migrate;
use crate::progress::ProgressMode;
use crate::registry::ScraperRegistry;
use crate::sqlite_store::SqliteStore;

/// Options for a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Stop after filling missing sources.
    pub skip_reviews: bool,
    /// Run discovery only and print what was found.
    pub dry_run: bool,
    pub progress: ProgressMode,
}

/// Run the pipeline against the configured sites over HTTP.
pub async fn run_pipeline(config: &Config, options: RunOptions) -> Result<()> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
    run_with_fetcher(config, fetcher, options).await
}

/// Like [`run_pipeline`], with the page source supplied by the caller.
pub async fn run_with_fetcher(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    options: RunOptions,
) -> Result<()> {
    let span = info_span!("run", run_id = %Uuid::new_v4());
    let registry = ScraperRegistry::from_config(config, fetcher, &span)?;
    if registry.list_scrapers().is_empty() && registry.review_scrapers().is_empty() {
        bail!("No sites enabled. Add a [sites.<name>] section to the config.");
    }

    let reporter = options.progress.reporter();

    if options.dry_run {
        // Discovery never touches the store.
        let store = InMemoryStore::new();
        let orchestrator = Orchestrator::new(
            &store,
            registry.list_scrapers(),
            registry.review_scrapers(),
        )
        .with_reporter(reporter.as_ref())
        .with_span(span);
        let records = orchestrator.discover().await?;
        print_dry_run(&records);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    let mut orchestrator = Orchestrator::new(
        &store,
        registry.list_scrapers(),
        registry.review_scrapers(),
    )
    .with_reporter(reporter.as_ref())
    .with_span(span)
    .skip_reviews(options.skip_reviews);
    let result = orchestrator.run().await;
    pool.close().await;

    print_summary(&result?, options.skip_reviews);
    Ok(())
}

fn print_dry_run(records: &[SourceRecord]) {
    println!("run (dry-run)");
    println!("  records found: {}", records.len());
    for record in records {
        let date = record
            .release_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<14} {:<10} {}  {}",
            record.source.site.as_str(),
            date,
            record.title,
            record.source.url
        );
    }
}

fn print_summary(summary: &RunSummary, skip_reviews: bool) {
    println!("run");
    println!("  records discovered: {}", summary.records_discovered);
    println!(
        "  movies: {} created, {} updated, {} unchanged",
        summary.movies_created, summary.movies_updated, summary.movies_unchanged
    );
    println!(
        "  sources: {} created, {} backfilled",
        summary.sources_created, summary.sources_backfilled
    );
    if skip_reviews {
        println!("  reviews: skipped");
    } else {
        println!(
            "  reviews: {} candidates, {} created, {} unchanged, {} empty, {} rejected",
            summary.review_candidates,
            summary.reviews_created,
            summary.reviews_unchanged,
            summary.reviews_skipped,
            summary.reviews_rejected
        );
    }
    println!("ok");
}
