//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/reel.sqlite"
//!
//! [fetch]
//! timeout_secs = 20
//! user_agent = "reel/0.1"
//!
//! [log]
//! level = "info"
//!
//! [sites.rottentomatoes]
//! list = true
//! reviews = true
//!
//! [sites.boxofficemojo]
//! list = true
//! year = 2024
//! ```
//!
//! Sites absent from `[sites]` are not scraped.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reel_core::Site;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Keyed by site name; validated against [`Site`] in [`load_config`].
    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    concat!("reel/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    /// Register this site's list scraper.
    #[serde(default)]
    pub list: bool,
    /// Register this site's review scraper.
    #[serde(default)]
    pub reviews: bool,
    /// Override the listing page URL.
    #[serde(default)]
    pub list_url: Option<String>,
    /// Box Office Mojo: the yearly chart to read. Defaults to the current year.
    #[serde(default)]
    pub year: Option<i32>,
}

impl Config {
    /// A config with only a database path; no sites enabled.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            fetch: FetchConfig::default(),
            log: LogConfig::default(),
            sites: BTreeMap::new(),
        }
    }

    /// Enabled sites in [`Site::ALL`] order, paired with their config.
    pub fn enabled_sites(&self) -> Vec<(Site, &SiteConfig)> {
        Site::ALL
            .iter()
            .filter_map(|site| self.sites.get(site.as_str()).map(|cfg| (*site, cfg)))
            .collect()
    }
}

/// Site-specific capability check: only some sites have review pages.
pub fn site_has_reviews(site: Site) -> bool {
    !matches!(site, Site::BoxOfficeMojo)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.fetch.timeout_secs == 0 {
        bail!("fetch.timeout_secs must be > 0");
    }
    if config.fetch.user_agent.trim().is_empty() {
        bail!("fetch.user_agent must not be empty");
    }

    for (name, site_cfg) in &config.sites {
        let site: Site = name
            .parse()
            .with_context(|| format!("Invalid [sites.{}] section", name))?;
        if name != site.as_str() {
            bail!("[sites.{}] must be written [sites.{}]", name, site.as_str());
        }
        if site_cfg.reviews && !site_has_reviews(site) {
            bail!("sites.{}.reviews: {} has no review pages", name, site.display_name());
        }
        if site_cfg.year.is_some() && site != Site::BoxOfficeMojo {
            bail!("sites.{}.year is only supported for boxofficemojo", name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Config> {
        let config: Config = toml::from_str(s)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn defaults_apply() {
        let cfg = parse(
            r#"
[db]
path = "./data/reel.sqlite"
"#,
        )
        .unwrap();
        assert_eq!(cfg.fetch.timeout_secs, 20);
        assert!(cfg.fetch.user_agent.starts_with("reel/"));
        assert_eq!(cfg.log.level, "info");
        assert!(cfg.enabled_sites().is_empty());
    }

    #[test]
    fn enabled_sites_follow_registration_order() {
        let cfg = parse(
            r#"
[db]
path = "x.sqlite"

[sites.boxofficemojo]
list = true
year = 2023

[sites.rottentomatoes]
list = true
reviews = true
"#,
        )
        .unwrap();
        let sites: Vec<Site> = cfg.enabled_sites().into_iter().map(|(s, _)| s).collect();
        assert_eq!(sites, vec![Site::RottenTomatoes, Site::BoxOfficeMojo]);
    }

    #[test]
    fn unknown_site_is_rejected() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[sites.letterboxd]
list = true
"#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("unknown site"));
    }

    #[test]
    fn boxofficemojo_reviews_are_rejected() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[sites.boxofficemojo]
reviews = true
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no review pages"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[fetch]
timeout_secs = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn site_keys_must_be_canonical() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[sites.IMDb]
list = true
reviews = true
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[sites.imdb]"));
    }
}
