//! URL handling module for Site-Snapshot
//!
//! This module provides URL canonicalization, first-party host matching and
//! stable page id derivation. Every other component compares URLs through
//! [`CanonicalUrl`] so the same logical URL always compares equal.

mod canonical;
mod hosts;
mod page_id;

// Re-export main functions
pub use canonical::{
    canonicalize, canonicalize_crawl_url, canonicalize_resource_url, CanonicalUrl,
    CanonicalizeOptions, DEFAULT_SCHEME,
};
pub use hosts::{matches_host_pattern, validate_host_pattern, SiteHosts};
pub use page_id::page_id_from_url;

/// Canonicalizes every input with `options`, dropping invalid entries
///
/// The result is sorted and free of duplicates.
pub fn canonicalize_all<I, S>(raw: I, options: CanonicalizeOptions<'_>) -> Vec<CanonicalUrl>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<CanonicalUrl> = raw
        .into_iter()
        .filter_map(|value| match canonicalize(value.as_ref(), options) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Dropping URL {:?}: {}", value.as_ref(), e);
                None
            }
        })
        .collect();
    out.sort();
    out.dedup();
    out
}
