//! Rotten Tomatoes: the in-theaters browse page and movie score boards.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, Span};

use reel_core::{
    ListScraper, MovieWithSources, NewSource, ReviewCandidate, ReviewScraper, Site, Source,
    SourceRecord, SourceRef,
};

use super::{absolute_url, pick_search_result, scrape_reviews, search_sources};
use crate::fetch::{element_text, selector, Fetcher};

pub const BASE_URL: &str = "https://www.rottentomatoes.com";
/// The last page of the A-Z browse view includes every tile.
pub const LIST_URL: &str = "https://www.rottentomatoes.com/browse/movies_in_theaters/sort:a_z?page=5";
const SEARCH_URL: &str = "https://www.rottentomatoes.com/search?search=";

const TITLE: &str = r#"span[data-qa="discovery-media-list-item-title"]"#;
const START_DATE: &str = r#"span[data-qa="discovery-media-list-item-start-date"]"#;

pub struct RottenTomatoesList {
    fetcher: Arc<dyn Fetcher>,
    span: Span,
    url: String,
}

impl RottenTomatoesList {
    pub fn new(fetcher: Arc<dyn Fetcher>, span: Span) -> Self {
        Self {
            fetcher,
            span,
            url: LIST_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl ListScraper for RottenTomatoesList {
    fn site(&self) -> Site {
        Site::RottenTomatoes
    }

    async fn run(&self) -> Result<Vec<SourceRecord>> {
        let Some(page) = self.fetcher.fetch(&self.url).await else {
            return Ok(Vec::new());
        };
        let records = parse_listing(&page.body)?;
        debug!(parent: &self.span, url = %self.url, records = records.len(), "parsed listing");
        Ok(records)
    }
}

/// Parse the "Opens Mar 1, 2024" / "Opened Mar 1, 2024" tile caption.
pub fn parse_open_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date = match text.split_once(' ') {
        Some((word, rest)) if word.starts_with("Open") => rest,
        _ => text,
    };
    NaiveDate::parse_from_str(date.trim(), "%b %d, %Y").ok()
}

/// Parse both tile layouts of the browse page: plain link tiles, whose
/// `href` is on the tile itself, and video tiles, which carry a caption link.
pub fn parse_listing(body: &str) -> Result<Vec<SourceRecord>> {
    let html = Html::parse_document(body);
    let link_tiles = selector("a.js-tile-link")?;
    let video_tiles = selector("div.js-tile-link")?;
    let caption = selector(r#"a[data-qa="discovery-media-list-item-caption"]"#)?;
    let title_sel = selector(TITLE)?;
    let start_sel = selector(START_DATE)?;

    let record = |tile: ElementRef<'_>, href: Option<&str>| -> Option<SourceRecord> {
        let title = element_text(tile.select(&title_sel).next()?);
        let url = absolute_url(BASE_URL, href?)?;
        if title.is_empty() {
            return None;
        }
        let release_date = tile
            .select(&start_sel)
            .next()
            .and_then(|el| parse_open_date(&element_text(el)));
        Some(SourceRecord {
            title,
            release_date,
            source: SourceRef::new(Site::RottenTomatoes, url),
        })
    };

    let mut records: Vec<SourceRecord> = html
        .select(&link_tiles)
        .filter_map(|tile| record(tile, tile.value().attr("href")))
        .collect();
    records.extend(html.select(&video_tiles).filter_map(|tile| {
        let href = tile
            .select(&caption)
            .next()
            .and_then(|a| a.value().attr("href"));
        record(tile, href)
    }));
    Ok(records)
}

pub struct RottenTomatoesReviews {
    fetcher: Arc<dyn Fetcher>,
    span: Span,
}

impl RottenTomatoesReviews {
    pub fn new(fetcher: Arc<dyn Fetcher>, span: Span) -> Self {
        Self { fetcher, span }
    }
}

#[async_trait]
impl ReviewScraper for RottenTomatoesReviews {
    fn site(&self) -> Site {
        Site::RottenTomatoes
    }

    async fn run(&self, movies: &[MovieWithSources]) -> Result<Vec<ReviewCandidate>> {
        Ok(scrape_reviews(
            self.fetcher.as_ref(),
            &self.span,
            Site::RottenTomatoes,
            movies,
            |source| Some(source.url.clone()),
            |page, source| parse_scores(&page.body, source),
        )
        .await)
    }

    async fn get_sources(&self, movies: &[MovieWithSources]) -> Result<Vec<NewSource>> {
        Ok(search_sources(
            self.fetcher.as_ref(),
            &self.span,
            Site::RottenTomatoes,
            movies,
            |title| format!("{}{}", SEARCH_URL, urlencoding::encode(title)),
            |page, title| parse_search(&page.body, title),
        )
        .await)
    }
}

/// Read the `score-board` element of a movie page. A page without one
/// yields an empty candidate, which the save-filter drops.
pub fn parse_scores(body: &str, source: &Source) -> Result<ReviewCandidate> {
    let html = Html::parse_document(body);
    let board_sel = selector("score-board")?;
    let audience_count_sel = selector(r#"a[data-qa="audience-rating-count"]"#)?;
    let critic_count_sel = selector(r#"a[data-qa="tomatometer-review-count"]"#)?;

    let mut candidate = ReviewCandidate::for_source(source);
    let Some(board) = html.select(&board_sel).next() else {
        return Ok(candidate);
    };

    let score = |attr: &str| {
        board
            .value()
            .attr(attr)
            .and_then(|v| v.trim().parse::<i64>().ok())
    };
    candidate.audience_score = score("audiencescore");
    candidate.critic_score = score("tomatometerscore");

    // "2,500+ Ratings" keeps only the number.
    candidate.audience_count = board
        .select(&audience_count_sel)
        .next()
        .and_then(|el| element_text(el).split_whitespace().next().map(String::from));
    candidate.critic_count = board
        .select(&critic_count_sel)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());

    Ok(candidate)
}

/// Find the movie page for `title` on a search results page.
pub fn parse_search(body: &str, title: &str) -> Result<Option<String>> {
    let html = Html::parse_document(body);
    let h1 = selector("h1")?;
    let movie_results = selector(r#"search-page-result[type="movie"]"#)?;
    let row = selector("search-page-media-row")?;
    let name = selector(r#"a[data-qa="info-name"]"#)?;

    let no_results = html
        .select(&h1)
        .next()
        .map(|el| el.value().classes().any(|c| c == "search__no-results-header"))
        .unwrap_or(false);
    if no_results {
        return Ok(None);
    }

    let Some(block) = html.select(&movie_results).next() else {
        return Ok(None);
    };
    let results: Vec<(String, String)> = block
        .select(&row)
        .filter_map(|r| r.select(&name).next())
        .filter_map(|a| {
            let url = absolute_url(BASE_URL, a.value().attr("href")?)?;
            Some((element_text(a), url))
        })
        .collect();

    Ok(pick_search_result(title, &results))
}
