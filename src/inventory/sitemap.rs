//! Sitemap fetching and parsing

use crate::crawler::{fetch_url, FetchedBody};
use crate::{SnapshotError, SnapshotResult};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct UrlSet {
    #[serde(rename = "url", default)]
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct UrlEntry {
    #[serde(default)]
    loc: Option<String>,
}

/// Extracts every `<url><loc>` value of a `<urlset>` document
///
/// Entities are decoded and values trimmed; empty locations are skipped.
/// Order follows the document. Canonicalization happens later, in
/// [`resolve`](crate::inventory::resolve).
///
/// # Examples
///
/// ```
/// use site_snapshot::inventory::parse_sitemap;
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/?a=1&amp;b=2</loc></url>
/// </urlset>"#;
/// assert_eq!(parse_sitemap(xml).unwrap(), vec!["https://example.com/?a=1&b=2"]);
/// ```
pub fn parse_sitemap(xml: &str) -> SnapshotResult<Vec<String>> {
    let set: UrlSet =
        quick_xml::de::from_str(xml).map_err(|e| SnapshotError::SitemapParse(e.to_string()))?;

    Ok(set
        .urls
        .into_iter()
        .filter_map(|entry| entry.loc)
        .map(|loc| loc.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect())
}

/// Downloads the sitemap document
///
/// A transport failure or a non-2xx status is a run-level error: without the
/// sitemap there is no inventory to capture.
pub async fn fetch_sitemap(client: &Client, url: &str) -> SnapshotResult<String> {
    let FetchedBody { status, body, .. } =
        fetch_url(client, url)
            .await
            .map_err(|source| SnapshotError::Http {
                url: url.to_string(),
                source,
            })?;

    if !(200..300).contains(&status) {
        return Err(SnapshotError::SitemapStatus {
            url: url.to_string(),
            status,
        });
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
