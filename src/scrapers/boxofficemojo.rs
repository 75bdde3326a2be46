//! Box Office Mojo: the yearly domestic box office table. List only.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, Span};

use reel_core::{ListScraper, Site, SourceRecord, SourceRef};

use super::absolute_url;
use crate::fetch::{element_text, selector, Fetcher};

pub const BASE_URL: &str = "https://www.boxofficemojo.com";

const TITLE_CELL: usize = 1;
const RELEASE_CELL: usize = 8;

pub fn list_url(year: i32) -> String {
    format!("{}/year/{}/", BASE_URL, year)
}

pub struct BoxOfficeMojoList {
    fetcher: Arc<dyn Fetcher>,
    span: Span,
    year: i32,
    url: String,
}

impl BoxOfficeMojoList {
    /// Scrape the chart for `year`, or the current year.
    pub fn new(fetcher: Arc<dyn Fetcher>, span: Span, year: Option<i32>) -> Self {
        let year = year.unwrap_or_else(|| chrono::Local::now().year());
        Self {
            fetcher,
            span,
            year,
            url: list_url(year),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ListScraper for BoxOfficeMojoList {
    fn site(&self) -> Site {
        Site::BoxOfficeMojo
    }

    async fn run(&self) -> Result<Vec<SourceRecord>> {
        let Some(page) = self.fetcher.fetch(&self.url).await else {
            return Ok(Vec::new());
        };
        let records = parse_table(&page.body, self.year)?;
        debug!(parent: &self.span, url = %self.url, year = self.year, records = records.len(), "parsed table");
        Ok(records)
    }
}

/// The table shows release dates as "Jan 17"; the year comes from the chart.
pub fn parse_release(cell: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {}", cell.trim(), year), "%b %d %Y").ok()
}

/// Parse table rows. Header rows (no `td`) and rows without a title link
/// are skipped; unreadable dates become `None`.
pub fn parse_table(body: &str, year: i32) -> Result<Vec<SourceRecord>> {
    let html = Html::parse_document(body);
    let row = selector("tbody tr")?;
    let cell = selector("td")?;
    let link = selector("a")?;

    let records = html
        .select(&row)
        .filter_map(|tr| {
            let cells: Vec<_> = tr.select(&cell).collect();
            let title_cell = cells.get(TITLE_CELL)?;
            let href = title_cell.select(&link).next()?.value().attr("href")?;
            let title = element_text(*title_cell);
            if title.is_empty() {
                return None;
            }
            let release_date = cells
                .get(RELEASE_CELL)
                .and_then(|td| parse_release(&element_text(*td), year));
            Some(SourceRecord {
                title,
                release_date,
                source: SourceRef::new(Site::BoxOfficeMojo, absolute_url(BASE_URL, href)?),
            })
        })
        .collect();
    Ok(records)
}
