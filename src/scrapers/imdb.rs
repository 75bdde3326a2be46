//! IMDb: the MOVIEmeter chart and per-title ratings pages.
//!
//! IMDb ratings are on a 10-point scale; they are stored ×10 so every site
//! reports 0–100.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, Span};

use reel_core::{
    ListScraper, MovieWithSources, NewSource, ReviewCandidate, ReviewScraper, Site, Source,
    SourceRecord, SourceRef,
};

use super::{absolute_url, pick_search_result, scrape_reviews, search_sources};
use crate::fetch::{element_text, selector, Fetcher};

pub const BASE_URL: &str = "https://www.imdb.com";
pub const LIST_URL: &str = "https://www.imdb.com/chart/moviemeter/?sort=release_date%2Cdesc";
const SEARCH_URL: &str = "https://www.imdb.com/find/?ref_=nv_sr_sm&q=";

pub struct ImdbList {
    fetcher: Arc<dyn Fetcher>,
    span: Span,
    url: String,
}

impl ImdbList {
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
impl ListScraper for ImdbList {
    fn site(&self) -> Site {
        Site::Imdb
    }

    async fn run(&self) -> Result<Vec<SourceRecord>> {
        let Some(page) = self.fetcher.fetch(&self.url).await else {
            return Ok(Vec::new());
        };
        let records = parse_chart(&page.body)?;
        debug!(parent: &self.span, url = %self.url, records = records.len(), "parsed chart");
        Ok(records)
    }
}

/// Parse chart entries. Unreleased titles, shown with a rating placeholder,
/// are skipped. The chart has no release dates.
pub fn parse_chart(body: &str) -> Result<Vec<SourceRecord>> {
    let html = Html::parse_document(body);
    let item = selector("ul.ipc-metadata-list li.ipc-metadata-list-summary-item")?;
    let link = selector("a.ipc-title-link-wrapper")?;
    let title_sel = selector("h3.ipc-title__text")?;
    let placeholder = selector("span.ratingGroup--placeholder")?;

    let records = html
        .select(&item)
        .filter(|li| li.select(&placeholder).next().is_none())
        .filter_map(|li| {
            let href = li.select(&link).next()?.value().attr("href")?;
            let title = element_text(li.select(&title_sel).next()?);
            if title.is_empty() {
                return None;
            }
            Some(SourceRecord {
                title,
                release_date: None,
                source: SourceRef::new(Site::Imdb, absolute_url(BASE_URL, href)?),
            })
        })
        .collect();
    Ok(records)
}

pub struct ImdbReviews {
    fetcher: Arc<dyn Fetcher>,
    span: Span,
}

impl ImdbReviews {
    pub fn new(fetcher: Arc<dyn Fetcher>, span: Span) -> Self {
        Self { fetcher, span }
    }
}

#[async_trait]
impl ReviewScraper for ImdbReviews {
    fn site(&self) -> Site {
        Site::Imdb
    }

    async fn run(&self, movies: &[MovieWithSources]) -> Result<Vec<ReviewCandidate>> {
        Ok(scrape_reviews(
            self.fetcher.as_ref(),
            &self.span,
            Site::Imdb,
            movies,
            |source| ratings_url(&source.url),
            |page, source| parse_ratings(&page.body, source),
        )
        .await)
    }

    async fn get_sources(&self, movies: &[MovieWithSources]) -> Result<Vec<NewSource>> {
        Ok(search_sources(
            self.fetcher.as_ref(),
            &self.span,
            Site::Imdb,
            movies,
            |title| format!("{}{}", SEARCH_URL, urlencoding::encode(title)),
            |page, title| parse_search(&page.body, title),
        )
        .await)
    }
}

/// The ratings page of a title: `<title url>/ratings`, without query string.
pub fn ratings_url(title_url: &str) -> Option<String> {
    let mut url = Url::parse(title_url).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join("ratings").ok().map(String::from)
}

fn scaled(text: &str) -> Option<i64> {
    let rating: f64 = text.split_whitespace().next()?.parse().ok()?;
    Some((rating * 10.0).round() as i64)
}

/// Parse a ratings page. The headline IMDb rating and its vote count are
/// recorded as the critic side; the page's arithmetic-mean label is the
/// audience score, which has no count.
pub fn parse_ratings(body: &str, source: &Source) -> Result<ReviewCandidate> {
    let html = Html::parse_document(body);
    let rating = selector("span.sc-5931bdee-1.jUnWeS")?;
    let votes = selector("div.sc-5931bdee-3.dWymrF")?;
    let mean = selector(r#"p[data-testid="calculations-label"]"#)?;

    let mut candidate = ReviewCandidate::for_source(source);
    candidate.critic_score = html
        .select(&rating)
        .next()
        .and_then(|el| scaled(&element_text(el)));
    candidate.critic_count = html
        .select(&votes)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    candidate.audience_score = html
        .select(&mean)
        .next()
        .and_then(|el| scaled(&element_text(el)));
    Ok(candidate)
}

/// Find the title page for `title` among search results.
pub fn parse_search(body: &str, title: &str) -> Result<Option<String>> {
    let html = Html::parse_document(body);
    let result = selector("a.ipc-metadata-list-summary-item__t")?;

    let results: Vec<(String, String)> = html
        .select(&result)
        .filter_map(|a| {
            let url = absolute_url(BASE_URL, a.value().attr("href")?)?;
            Some((element_text(a), url))
        })
        .collect();
    Ok(pick_search_result(title, &results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        Source {
            id: 11,
            movie_id: 4,
            site: Site::Imdb,
            url: "https://www.imdb.com/title/tt15239678/?ref_=chtmvm_t_1".into(),
            created_at: 0,
        }
    }

    #[test]
    fn ratings_url_drops_query_and_appends_segment() {
        assert_eq!(
            ratings_url(&source().url).as_deref(),
            Some("https://www.imdb.com/title/tt15239678/ratings")
        );
        assert_eq!(
            ratings_url("https://www.imdb.com/title/tt15239678").as_deref(),
            Some("https://www.imdb.com/title/tt15239678/ratings")
        );
        assert_eq!(ratings_url("not a url"), None);
    }

    #[test]
    fn chart_skips_placeholders() {
        let body = r#"
<ul class="ipc-metadata-list">
  <li class="ipc-metadata-list-summary-item">
    <a class="ipc-title-link-wrapper" href="/title/tt15239678/?ref_=chtmvm_t_1">
      <h3 class="ipc-title__text">Dune: Part Two</h3>
    </a>
    <span class="ratingGroup--imdb-rating">8.6</span>
  </li>
  <li class="ipc-metadata-list-summary-item">
    <a class="ipc-title-link-wrapper" href="/title/tt0000001/">
      <h3 class="ipc-title__text">Not Out Yet</h3>
    </a>
    <span class="ratingGroup--placeholder"></span>
  </li>
</ul>"#;

        let records = parse_chart(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Dune: Part Two");
        assert_eq!(records[0].release_date, None);
        assert_eq!(
            records[0].source.url,
            "https://www.imdb.com/title/tt15239678/?ref_=chtmvm_t_1"
        );
    }

    #[test]
    fn ratings_are_scaled_to_100() {
        let body = r#"
<span class="sc-5931bdee-1 jUnWeS">8.6</span>
<div class="sc-5931bdee-3 dWymrF">412K</div>
<p data-testid="calculations-label">8.3 Arithmetic mean</p>"#;

        let c = parse_ratings(body, &source()).unwrap();
        assert_eq!(c.source_id, Some(11));
        assert_eq!(c.critic_score, Some(86));
        assert_eq!(c.critic_count.as_deref(), Some("412K"));
        assert_eq!(c.audience_score, Some(83));
        assert_eq!(c.audience_count, None);
    }

    #[test]
    fn search_prefers_exact_title() {
        let body = r#"
<a class="ipc-metadata-list-summary-item__t" href="/title/tt1/">Dune: Part Two</a>
<a class="ipc-metadata-list-summary-item__t" href="/title/tt2/">Dune</a>"#;
        assert_eq!(
            parse_search(body, "DUNE").unwrap().as_deref(),
            Some("https://www.imdb.com/title/tt2/")
        );
        assert_eq!(parse_search("<p>nothing</p>", "Dune").unwrap(), None);
    }
}
