//! `reel sites`: known sites and their enabled scrapers.

use anyhow::Result;

use reel_core::Site;

use crate::config::{site_has_reviews, Config};

/// One row of `reel sites` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteStatus {
    pub site: Site,
    pub list: &'static str,
    pub reviews: &'static str,
}

/// Status of every known site under `config`.
pub fn site_statuses(config: &Config) -> Vec<SiteStatus> {
    Site::ALL
        .iter()
        .map(|&site| {
            let cfg = config.sites.get(site.as_str());
            let list = match cfg {
                Some(c) if c.list => "enabled",
                _ => "off",
            };
            let reviews = match cfg {
                _ if !site_has_reviews(site) => "n/a",
                Some(c) if c.reviews => "enabled",
                _ => "off",
            };
            SiteStatus {
                site,
                list,
                reviews,
            }
        })
        .collect()
}

pub fn list_sites(config: &Config) -> Result<()> {
    println!("{:<16} {:<20} {:<10} REVIEWS", "SITE", "NAME", "LIST");
    for s in site_statuses(config) {
        println!(
            "{:<16} {:<20} {:<10} {}",
            s.site.as_str(),
            s.site.display_name(),
            s.list,
            s.reviews
        );
    }
    Ok(())
}
