//! Inventory resolution
//!
//! The crawl set is the union of the sitemap and the site's navigation links,
//! canonicalized so each logical page appears exactly once.

mod nav;
mod sitemap;

pub use nav::{collect_nav_urls, NAV_SESSION};
pub use sitemap::{fetch_sitemap, parse_sitemap};

pub(crate) use nav::json_kind;

use crate::url::{canonicalize_all, CanonicalUrl, CanonicalizeOptions, SiteHosts};

/// The resolved crawl inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Canonical sitemap URLs, sorted and unique
    pub sitemap: Vec<CanonicalUrl>,
    /// Canonical first-party navigation URLs, sorted and unique
    pub nav: Vec<CanonicalUrl>,
    /// Union of both lists, sorted and unique
    pub all: Vec<CanonicalUrl>,
}

/// Merges raw sitemap and navigation URLs into one canonical crawl set
///
/// Every URL is canonicalized with its scheme forced to `crawl_scheme`;
/// invalid URLs are dropped. Navigation URLs outside the site's hosts are
/// discarded; sitemap URLs are trusted as listed.
///
/// # Examples
///
/// ```
/// use site_snapshot::inventory::resolve;
/// use site_snapshot::url::SiteHosts;
///
/// let hosts = SiteHosts::new(["example.com"]).unwrap();
/// let inventory = resolve(
///     &["http://example.com/a/".to_string()],
///     &["https://example.com/a".to_string(), "https://elsewhere.test/".to_string()],
///     &hosts,
///     "https",
/// );
/// assert_eq!(inventory.all.len(), 1);
/// assert_eq!(inventory.all[0].as_str(), "https://example.com/a");
/// ```
pub fn resolve(
    sitemap_raw: &[String],
    nav_raw: &[String],
    hosts: &SiteHosts,
    crawl_scheme: &str,
) -> Inventory {
    let options = CanonicalizeOptions::crawl(crawl_scheme);

    let sitemap = canonicalize_all(sitemap_raw, options);

    let mut nav = canonicalize_all(nav_raw, options);
    nav.retain(|url| {
        let internal = hosts.is_internal(url);
        if !internal {
            tracing::debug!("Ignoring outbound navigation link {}", url);
        }
        internal
    });

    let mut all: Vec<CanonicalUrl> = sitemap.iter().chain(nav.iter()).cloned().collect();
    all.sort();
    all.dedup();

    Inventory { sitemap, nav, all }
}
