//! Site scrapers.
//!
//! Each site module provides a [`ListScraper`](reel_core::ListScraper) and,
//! where the site has rating pages, a [`ReviewScraper`](reel_core::ReviewScraper).
//! Scrapers share one [`Fetcher`](crate::fetch::Fetcher) and log under the
//! run span they were built with.
//!
//! Page parsing is synchronous and separate from fetching, so parsers can be
//! tested against inline HTML.

pub mod boxofficemojo;
pub mod imdb;
pub mod rottentomatoes;

use reqwest::Url;
use tracing::{debug, warn, Span};

use reel_core::{MovieWithSources, NewSource, ReviewCandidate, Site, Source};

use crate::fetch::{Fetcher, Page};

/// Resolve `href` against `base`. Absolute hrefs are returned unchanged.
pub(crate) fn absolute_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href.trim()).ok().map(String::from)
}

/// Pick the search result whose title equals `title` (case-insensitive),
/// falling back to the first result.
pub(crate) fn pick_search_result(title: &str, results: &[(String, String)]) -> Option<String> {
    let wanted = title.to_lowercase();
    results
        .iter()
        .find(|(t, _)| t.to_lowercase() == wanted)
        .or_else(|| results.first())
        .map(|(_, url)| url.clone())
}

/// Fetch one page per movie that has a `site` source and parse it.
///
/// Movies without a source, pages that fail to fetch, and pages that fail to
/// parse are logged and left out.
pub(crate) async fn scrape_reviews<U, P>(
    fetcher: &dyn Fetcher,
    span: &Span,
    site: Site,
    movies: &[MovieWithSources],
    page_url: U,
    parse: P,
) -> Vec<ReviewCandidate>
where
    U: Fn(&Source) -> Option<String> + Sync,
    P: Fn(&Page, &Source) -> anyhow::Result<ReviewCandidate> + Sync,
{
    let mut candidates = Vec::new();
    for movie in movies {
        let Some(source) = movie.source_for(site) else {
            continue;
        };
        let Some(url) = page_url(source) else {
            warn!(parent: span, %site, url = %source.url, "cannot build ratings url");
            continue;
        };
        let Some(page) = fetcher.fetch(&url).await else {
            continue;
        };
        match parse(&page, source) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => warn!(parent: span, %site, %url, error = %e, "failed to parse ratings page"),
        }
    }
    candidates
}

/// Search `site` for each movie's title and collect the resolved links.
pub(crate) async fn search_sources<U, P>(
    fetcher: &dyn Fetcher,
    span: &Span,
    site: Site,
    movies: &[MovieWithSources],
    search_url: U,
    pick: P,
) -> Vec<NewSource>
where
    U: Fn(&str) -> String + Sync,
    P: Fn(&Page, &str) -> anyhow::Result<Option<String>> + Sync,
{
    let mut sources = Vec::new();
    for movie in movies {
        let title = &movie.movie.title;
        let Some(page) = fetcher.fetch(&search_url(title)).await else {
            continue;
        };
        match pick(&page, title) {
            Ok(Some(url)) => sources.push(NewSource {
                movie_id: movie.id(),
                site,
                url,
            }),
            Ok(None) => debug!(parent: span, %site, %title, "no search result"),
            Err(e) => warn!(parent: span, %site, %title, error = %e, "failed to parse search page"),
        }
    }
    sources
}
