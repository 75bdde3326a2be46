//! # Reel CLI (`reel`)
//!
//! ## Usage
//!
//! ```bash
//! reel --config ./config/reel.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reel init` | Create the SQLite database and run schema migrations |
//! | `reel sites` | List known sites and which scrapers are enabled |
//! | `reel run` | Scrape every enabled site and reconcile into the database |
//! | `reel movies` | List stored movies with links and latest ratings |
//! | `reel stats` | Show counts per table and per site |
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG` to override
//! `[log].level`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reel::config;
use reel::pipeline::{self, RunOptions};
use reel::progress::ProgressMode;
use reel::{migrate, movies, sites, stats};

/// Reel: movie ratings aggregated from several sites into one database.
#[derive(Parser)]
#[command(name = "reel", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/reel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the movies, sources and reviews
    /// tables. Running it again is safe.
    Init,

    /// List known sites and whether their scrapers are enabled.
    Sites,

    /// Scrape enabled sites and reconcile the results.
    ///
    /// Runs discovery, movie reconciliation, missing-link backfill and
    /// review collection, in that order. Reruns are idempotent.
    Run {
        /// Stop after backfilling missing links; do not collect ratings.
        #[arg(long)]
        skip_reviews: bool,

        /// Only run discovery and print what was found; write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr: `auto`, `human`, `json` or `off`.
        #[arg(long, default_value = "auto", value_parser = ["auto", "human", "json", "off"])]
        progress: String,
    },

    /// List stored movies with their links and latest ratings.
    Movies {
        /// Case-insensitive title fragment.
        #[arg(long)]
        title: Option<String>,

        /// Maximum number of movies to print.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show database statistics.
    Stats,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.log.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sites => {
            sites::list_sites(&cfg)?;
        }
        Commands::Run {
            skip_reviews,
            dry_run,
            progress,
        } => {
            let progress = ProgressMode::from_flag(&progress)
                .ok_or_else(|| anyhow::anyhow!("invalid --progress value: {}", progress))?;
            pipeline::run_pipeline(
                &cfg,
                RunOptions {
                    skip_reviews,
                    dry_run,
                    progress,
                },
            )
            .await?;
        }
        Commands::Movies { title, limit } => {
            movies::list_movies(&cfg, title.as_deref(), limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
