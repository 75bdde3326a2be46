//! # Reel
//!
//! Collects movie metadata and critic/audience ratings from several movie
//! sites and reconciles them into one SQLite database.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ List scrapers│──▶│ Orchestrator │──▶│    SQLite    │
//! │ RT/IMDb/BOM  │   │ stages A-D   │   │ movies/      │
//! └──────────────┘   └──────┬───────┘   │ sources/     │
//!                           │           │ reviews      │
//! ┌──────────────┐          │           └──────────────┘
//! │Review scrapers│◀────────┘
//! │ RT/IMDb      │
//! └──────────────┘
//! ```
//!
//! The reconciliation logic (matching, merging, source backfill, review
//! save-filter, stage ordering) lives in the `reel-core` crate. This crate
//! supplies the SQLite store, the HTTP fetcher, the site scrapers and the
//! CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! reel init                     # create database
//! reel run                      # scrape and reconcile every enabled site
//! reel movies --title dune      # inspect what was collected
//! reel stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | `Store` implementation over SQLite |
//! | [`fetch`] | HTTP page fetching |
//! | [`scrapers`] | Rotten Tomatoes, IMDb and Box Office Mojo scrapers |
//! | [`registry`] | Scraper registration from config |
//! | [`pipeline`] | `reel run` |
//! | [`progress`] | Progress reporting on stderr |
//! | [`movies`] | `reel movies` |
//! | [`sites`] | `reel sites` |
//! | [`stats`] | `reel stats` |

pub mod config;
pub mod db;
pub mod fetch;
pub mod migrate;
pub mod movies;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod scrapers;
pub mod sites;
pub mod sqlite_store;
pub mod stats;
