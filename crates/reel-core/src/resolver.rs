//! Source attachment: give movies a link to sites they are missing.

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::{MovieWithSources, Site, Source};
use crate::scraper::ReviewScraper;
use crate::store::Store;

/// Movies without any source for `site`.
pub fn movies_missing_site(movies: &[MovieWithSources], site: Site) -> Vec<MovieWithSources> {
    movies
        .iter()
        .filter(|m| !m.has_site(site))
        .cloned()
        .collect()
}

/// Look up and persist a `scraper.site()` source for every movie lacking one.
///
/// Unresolved movies are skipped until the next run. A lookup that fails
/// outright is logged and treated as resolving nothing. Returns the sources
/// created by this call.
pub async fn fill_missing_sources(
    store: &dyn Store,
    movies: &[MovieWithSources],
    scraper: &dyn ReviewScraper,
) -> Result<Vec<Source>> {
    let site = scraper.site();
    let missing = movies_missing_site(movies, site);
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    let resolved = match scraper.get_sources(&missing).await {
        Ok(r) => r,
        Err(e) => {
            warn!(scraper = %scraper.name(), error = %e, "source lookup failed");
            return Ok(Vec::new());
        }
    };
    debug!(
        %site,
        missing = missing.len(),
        resolved = resolved.len(),
        "resolved missing sources"
    );

    let mut created_sources = Vec::new();
    for source in &resolved {
        if source.site != site || !missing.iter().any(|m| m.id() == source.movie_id) {
            warn!(
                scraper = %scraper.name(),
                movie_id = source.movie_id,
                site = %source.site,
                "ignoring source outside the requested set"
            );
            continue;
        }
        let (row, created) = store.get_or_create_source(source).await?;
        if created {
            created_sources.push(row);
        }
    }

    Ok(created_sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMovie, NewSource, ReviewCandidate};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    /// Resolves every movie except those titled "Unknown".
    struct SearchStub;

    #[async_trait]
    impl ReviewScraper for SearchStub {
        fn site(&self) -> Site {
            Site::Imdb
        }

        async fn run(&self, _movies: &[MovieWithSources]) -> Result<Vec<ReviewCandidate>> {
            Ok(Vec::new())
        }

        async fn get_sources(&self, movies: &[MovieWithSources]) -> Result<Vec<NewSource>> {
            Ok(movies
                .iter()
                .filter(|m| m.movie.title != "Unknown")
                .map(|m| NewSource {
                    movie_id: m.id(),
                    site: Site::Imdb,
                    url: format!("https://imdb.test/{}", m.id()),
                })
                .collect())
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl ReviewScraper for BrokenSearch {
        fn site(&self) -> Site {
            Site::Imdb
        }

        async fn run(&self, _movies: &[MovieWithSources]) -> Result<Vec<ReviewCandidate>> {
            Ok(Vec::new())
        }

        async fn get_sources(&self, _movies: &[MovieWithSources]) -> Result<Vec<NewSource>> {
            anyhow::bail!("search page unavailable")
        }
    }

    async fn seed(store: &InMemoryStore, titles: &[&str]) {
        for t in titles {
            store
                .insert_movie(&NewMovie {
                    title: t.to_string(),
                    release_date: None,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn fills_only_missing_and_resolvable() {
        let store = InMemoryStore::new();
        seed(&store, &["Dune", "Unknown", "Barbie"]).await;
        store
            .get_or_create_source(&NewSource {
                movie_id: 3,
                site: Site::Imdb,
                url: "https://imdb.test/barbie".into(),
            })
            .await
            .unwrap();

        let movies = store.list_movies().await.unwrap();
        assert_eq!(movies_missing_site(&movies, Site::Imdb).len(), 2);

        let created = fill_missing_sources(&store, &movies, &SearchStub)
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].movie_id, 1);

        let movies = store.list_movies().await.unwrap();
        let again = fill_missing_sources(&store, &movies, &SearchStub)
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(store.counts().await.unwrap().sources, 2);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_fatal() {
        let store = InMemoryStore::new();
        seed(&store, &["Dune"]).await;
        let movies = store.list_movies().await.unwrap();
        let created = fill_missing_sources(&store, &movies, &BrokenSearch)
            .await
            .unwrap();
        assert!(created.is_empty());
    }
}
