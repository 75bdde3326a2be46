//! Scraper registration.
//!
//! Sites are selected from a static list: [`ScraperRegistry::from_config`]
//! walks [`Site::ALL`] and registers the list and review scrapers enabled
//! under `[sites.<name>]`. Registration order is the order Stage A flattens
//! its results in.
//!
//! ```rust
//! use reel::registry::ScraperRegistry;
//!
//! let mut scrapers = ScraperRegistry::new();
//! // scrapers.register_list(Box::new(MyListScraper::new()));
//! assert!(scrapers.is_empty());
//! ```

use anyhow::Result;
use std::sync::Arc;
use tracing::Span;

use reel_core::{ListScraper, ReviewScraper, Site};

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::scrapers::boxofficemojo::BoxOfficeMojoList;
use crate::scrapers::imdb::{ImdbList, ImdbReviews};
use crate::scrapers::rottentomatoes::{RottenTomatoesList, RottenTomatoesReviews};

/// Registered list and review scrapers, in registration order.
#[derive(Default)]
pub struct ScraperRegistry {
    list: Vec<Box<dyn ListScraper>>,
    review: Vec<Box<dyn ReviewScraper>>,
}

impl ScraperRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in scrapers enabled in `config`. Every scraper
    /// shares `fetcher` and logs under `span`.
    pub fn from_config(config: &Config, fetcher: Arc<dyn Fetcher>, span: &Span) -> Result<Self> {
        let mut registry = Self::new();

        for (site, cfg) in config.enabled_sites() {
            if cfg.list {
                let scraper: Box<dyn ListScraper> = match site {
                    Site::RottenTomatoes => {
                        let s = RottenTomatoesList::new(fetcher.clone(), span.clone());
                        match &cfg.list_url {
                            Some(url) => Box::new(s.with_url(url)),
                            None => Box::new(s),
                        }
                    }
                    Site::Imdb => {
                        let s = ImdbList::new(fetcher.clone(), span.clone());
                        match &cfg.list_url {
                            Some(url) => Box::new(s.with_url(url)),
                            None => Box::new(s),
                        }
                    }
                    Site::BoxOfficeMojo => {
                        let s = BoxOfficeMojoList::new(fetcher.clone(), span.clone(), cfg.year);
                        match &cfg.list_url {
                            Some(url) => Box::new(s.with_url(url)),
                            None => Box::new(s),
                        }
                    }
                };
                registry.register_list(scraper);
            }

            if cfg.reviews {
                match site {
                    Site::RottenTomatoes => registry.register_review(Box::new(
                        RottenTomatoesReviews::new(fetcher.clone(), span.clone()),
                    )),
                    Site::Imdb => registry
                        .register_review(Box::new(ImdbReviews::new(fetcher.clone(), span.clone()))),
                    Site::BoxOfficeMojo => {
                        anyhow::bail!("{} has no review scraper", site.display_name())
                    }
                }
            }
        }

        Ok(registry)
    }

    /// Register a list scraper.
    pub fn register_list(&mut self, scraper: Box<dyn ListScraper>) {
        self.list.push(scraper);
    }

    /// Register a review scraper.
    pub fn register_review(&mut self, scraper: Box<dyn ReviewScraper>) {
        self.review.push(scraper);
    }

    pub fn list_scrapers(&self) -> &[Box<dyn ListScraper>] {
        &self.list
    }

    pub fn review_scrapers(&self) -> &[Box<dyn ReviewScraper>] {
        &self.review
    }

    /// Total number of registered scrapers.
    pub fn len(&self) -> usize {
        self.list.len() + self.review.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
