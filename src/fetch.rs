//! HTTP page fetching for the site scrapers.
//!
//! A failed fetch is not an error: scrapers skip the page and move on, so
//! [`Fetcher::fetch`] logs the failure and returns `None`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchConfig;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub body: String,
}

impl Page {
    /// Parse the body. `Html` is not `Send`, so parse inside synchronous
    /// code and drop it before the next `.await`.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url`. Returns `None` on transport errors and non-2xx responses.
    async fn fetch(&self, url: &str) -> Option<Page>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<Page> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(%url, error = %e, "request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "unexpected status");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                debug!(%url, bytes = body.len(), "fetched page");
                Some(Page {
                    url: url.to_string(),
                    body,
                })
            }
            Err(e) => {
                warn!(%url, error = %e, "failed to read response body");
                None
            }
        }
    }
}

/// Serves pages from memory. Unknown URLs behave like a failed fetch.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Option<Page> {
        self.pages.get(url).map(|body| Page {
            url: url.to_string(),
            body: body.clone(),
        })
    }
}

/// Parse a CSS selector, turning the borrowed parse error into an owned one.
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {:?}", css, e))
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_fetcher_misses_unknown_urls() {
        let fetcher = StaticFetcher::new().with_page("https://a.test/", "<p>hi</p>");
        assert!(fetcher.fetch("https://a.test/").await.is_some());
        assert!(fetcher.fetch("https://b.test/").await.is_none());
    }

    #[test]
    fn element_text_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  Opens\n  Mar 1,   2024 </p>");
        let sel = selector("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(element_text(p), "Opens Mar 1, 2024");
    }

    #[test]
    fn bad_selector_is_an_error() {
        assert!(selector("a[").is_err());
    }
}
