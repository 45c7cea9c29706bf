use crate::url::CanonicalUrl;
use sha2::{Digest, Sha256};

/// Longest slug kept before the hash suffix
const MAX_SLUG_LEN: usize = 72;

/// Hex characters of the URL hash appended to the slug
const HASH_LEN: usize = 10;

/// Derives a stable page id from a canonical page URL
///
/// The id is a readable slug of the path (and query, if any) followed by a
/// short SHA-256 of the full URL string. It depends only on the URL, so every
/// run produces the same id for the same page.
///
/// # Examples
///
/// ```
/// use site_snapshot::url::{canonicalize_crawl_url, page_id_from_url};
///
/// let url = canonicalize_crawl_url("https://example.com/About/Team/").unwrap();
/// let id = page_id_from_url(&url);
/// assert!(id.starts_with("about-team-"));
/// ```
pub fn page_id_from_url(url: &CanonicalUrl) -> String {
    let mut source = url.path().trim_matches('/').to_string();
    if source.is_empty() {
        source = "home".to_string();
    }
    if let Some(query) = url.query() {
        source = format!("{}-{}", source, query);
    }

    let mut slug = slugify(&source);
    if slug.is_empty() {
        slug = "home".to_string();
    }
    slug.truncate(MAX_SLUG_LEN);

    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    format!("{}-{}", slug, &digest[..HASH_LEN])
}

/// Lowercases and collapses every run of non-alphanumerics into one `-`
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
