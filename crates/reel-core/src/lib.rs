//! # Reel Core
//!
//! Storage-agnostic reconciliation logic for Reel: data models, the
//! [`store::Store`] and scraper traits, title matching, the merge policy,
//! the review save-filter, source backfilling, and the staged pipeline
//! orchestrator.
//!
//! This crate contains no tokio, sqlx, HTTP, or HTML dependencies. Concrete
//! stores and scrapers live in the `reel` crate.
//!
//! ## Pipeline
//!
//! ```text
//! list scrapers ──▶ matcher ──▶ merge policy ──▶ store
//!                                                  │
//!        review scrapers ◀── resolver (backfill) ◀─┘
//!              │
//!              └──▶ save-filter ──▶ store
//! ```

pub mod error;
pub mod filter;
pub mod matcher;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod scraper;
pub mod store;

pub use error::ReconcileError;
pub use models::{
    Movie, MovieWithSources, NewMovie, NewReview, NewSource, Review, ReviewCandidate, Site,
    Source, SourceRecord, SourceRef,
};
pub use orchestrator::{Orchestrator, RunSummary};
pub use scraper::{ListScraper, ReviewScraper};
pub use store::Store;
