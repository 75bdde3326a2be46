//! Core data models used throughout Reel.
//!
//! Stored entities ([`Movie`], [`Source`], [`Review`]) carry store-assigned
//! integer ids. Transient records ([`SourceRecord`], [`ReviewCandidate`]) are
//! what scrapers produce before reconciliation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// The closed set of external sites Reel knows how to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    RottenTomatoes,
    Imdb,
    BoxOfficeMojo,
}

impl Site {
    /// Every known site, in registration order.
    pub const ALL: [Site; 3] = [Site::RottenTomatoes, Site::Imdb, Site::BoxOfficeMojo];

    /// Stable lowercase name, as stored in the `sources.site` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::RottenTomatoes => "rottentomatoes",
            Site::Imdb => "imdb",
            Site::BoxOfficeMojo => "boxofficemojo",
        }
    }

    /// Human-readable name for CLI output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Site::RottenTomatoes => "Rotten Tomatoes",
            Site::Imdb => "IMDb",
            Site::BoxOfficeMojo => "Box Office Mojo",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rottentomatoes" => Ok(Site::RottenTomatoes),
            "imdb" => Ok(Site::Imdb),
            "boxofficemojo" => Ok(Site::BoxOfficeMojo),
            other => Err(ReconcileError::UnknownSite(other.to_string())),
        }
    }
}

/// A stored movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub created_at: i64,
}

/// Fields needed to insert a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: Option<NaiveDate>,
}

/// One site's link for one movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub id: i64,
    pub movie_id: i64,
    pub site: Site,
    pub url: String,
    pub created_at: i64,
}

/// Get-or-create key for a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewSource {
    pub movie_id: i64,
    pub site: Site,
    pub url: String,
}

/// A site + URL pair as reported by a scraper, before it is owned by a movie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRef {
    pub site: Site,
    pub url: String,
}

impl SourceRef {
    pub fn new(site: Site, url: impl Into<String>) -> Self {
        Self {
            site,
            url: url.into(),
        }
    }

    pub fn for_movie(&self, movie_id: i64) -> NewSource {
        NewSource {
            movie_id,
            site: self.site,
            url: self.url.clone(),
        }
    }
}

/// A movie together with its sources, ordered by source id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovieWithSources {
    pub movie: Movie,
    pub sources: Vec<Source>,
}

impl MovieWithSources {
    pub fn id(&self) -> i64 {
        self.movie.id
    }

    pub fn has_site(&self, site: Site) -> bool {
        self.sources.iter().any(|s| s.site == site)
    }

    pub fn has_url(&self, url: &str) -> bool {
        self.sources.iter().any(|s| s.url == url)
    }

    /// The oldest source for `site`, if any.
    pub fn source_for(&self, site: Site) -> Option<&Source> {
        self.sources
            .iter()
            .filter(|s| s.site == site)
            .min_by_key(|s| s.id)
    }
}

/// One scraper's claim about a movie, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub source: SourceRef,
}

/// A stored ratings snapshot for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: i64,
    pub source_id: i64,
    pub audience_score: Option<i64>,
    pub audience_count: Option<String>,
    pub critic_score: Option<i64>,
    pub critic_count: Option<String>,
    pub created_at: i64,
}

/// Get-or-create key for a [`Review`]: the full field tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewReview {
    pub source_id: i64,
    pub audience_score: Option<i64>,
    pub audience_count: Option<String>,
    pub critic_score: Option<i64>,
    pub critic_count: Option<String>,
}

impl NewReview {
    /// Whether a stored review carries exactly this tuple.
    pub fn matches(&self, review: &Review) -> bool {
        review.source_id == self.source_id
            && review.audience_score == self.audience_score
            && review.audience_count == self.audience_count
            && review.critic_score == self.critic_score
            && review.critic_count == self.critic_count
    }
}

impl TryFrom<&ReviewCandidate> for NewReview {
    type Error = ReconcileError;

    fn try_from(candidate: &ReviewCandidate) -> Result<Self, Self::Error> {
        let source_id = candidate
            .source_id
            .ok_or(ReconcileError::MissingSourceId {
                movie_id: candidate.movie_id,
            })?;
        Ok(Self {
            source_id,
            audience_score: candidate.audience_score,
            audience_count: candidate.audience_count.clone(),
            critic_score: candidate.critic_score,
            critic_count: candidate.critic_count.clone(),
        })
    }
}

/// Ratings scraped from a site's movie page, before the save-filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewCandidate {
    pub source_id: Option<i64>,
    pub movie_id: Option<i64>,
    pub audience_score: Option<i64>,
    pub audience_count: Option<String>,
    pub critic_score: Option<i64>,
    pub critic_count: Option<String>,
}

impl ReviewCandidate {
    /// An empty candidate for `source`, to be filled in by a page parser.
    pub fn for_source(source: &Source) -> Self {
        Self {
            source_id: Some(source.id),
            movie_id: Some(source.movie_id),
            ..Self::default()
        }
    }
}

/// Row counts across the three entity tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub movies: i64,
    pub sources: i64,
    pub reviews: i64,
}
