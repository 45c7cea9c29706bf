//! Asset discovery from captured page JSON

use crate::classify::{Reason, ResourceClassifier};
use crate::crawler::PageRecord;
use crate::output::RunLayout;
use crate::url::{canonicalize_resource_url, CanonicalUrl};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// How the page referenced an asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initiator {
    Image,
    Script,
    Stylesheet,
    Video,
    /// A performance resource entry, with its recorded `initiatorType`
    ResourceEntry(Option<String>),
}

impl Initiator {
    /// Initiator hint handed to the classifier
    pub fn hint(&self) -> Option<&str> {
        match self {
            Initiator::Image => Some("image"),
            Initiator::Script => Some("script"),
            Initiator::Stylesheet => Some("css"),
            Initiator::Video => Some("video"),
            Initiator::ResourceEntry(kind) => kind.as_deref(),
        }
    }
}

impl fmt::Display for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint().unwrap_or("resource"))
    }
}

/// An included asset, keyed by its canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrl {
    pub url: CanonicalUrl,
    /// Initiator of the first reference found
    pub initiator: Initiator,
}

/// Result of scanning every captured page
#[derive(Debug, Default)]
pub struct Discovery {
    /// Included assets sorted by URL
    pub queue: Vec<AssetUrl>,
    /// Distinct excluded URLs per exclusion reason
    pub exclusions: BTreeMap<Reason, usize>,
    /// Page JSON files actually read
    pub pages_scanned: usize,
}

impl Discovery {
    /// Queue as plain URLs, in order
    pub fn urls(&self) -> Vec<CanonicalUrl> {
        self.queue.iter().map(|asset| asset.url.clone()).collect()
    }
}

/// Scans the page JSON of every successful capture for asset references
///
/// Unreadable page JSON is logged and skipped. A URL excluded through one
/// reference but included through another counts as included.
pub fn discover_assets(
    pages: &[PageRecord],
    layout: &RunLayout,
    classifier: &ResourceClassifier,
) -> Discovery {
    let mut included: BTreeMap<CanonicalUrl, Initiator> = BTreeMap::new();
    let mut excluded: BTreeMap<CanonicalUrl, Reason> = BTreeMap::new();
    let mut pages_scanned = 0;

    for record in pages.iter().filter(|r| r.is_success()) {
        let Some(json_file) = record.json_file.as_deref() else {
            continue;
        };
        let path = layout.resolve(json_file);
        let data: Value = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()))
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Skipping unreadable page JSON {}: {}", path.display(), e);
                continue;
            }
        };
        pages_scanned += 1;

        for (raw, initiator) in page_references(&data) {
            let url = match canonicalize_resource_url(&raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Ignoring asset reference {:?}: {}", raw, e);
                    continue;
                }
            };
            let decision = classifier.classify(&url, initiator.hint());
            if decision.include {
                included.entry(url).or_insert(initiator);
            } else {
                excluded.entry(url).or_insert(decision.reason);
            }
        }
    }

    let mut exclusions = BTreeMap::new();
    for (url, reason) in &excluded {
        if !included.contains_key(url) {
            *exclusions.entry(*reason).or_insert(0) += 1;
        }
    }

    tracing::debug!(
        "Discovery scanned {} pages: {} included, {} excluded",
        pages_scanned,
        included.len(),
        exclusions.values().sum::<usize>()
    );

    Discovery {
        queue: included
            .into_iter()
            .map(|(url, initiator)| AssetUrl { url, initiator })
            .collect(),
        exclusions,
        pages_scanned,
    }
}

/// Every raw asset reference of one page, in document field order
fn page_references(data: &Value) -> Vec<(String, Initiator)> {
    let mut refs = Vec::new();

    for image in array(data, "images") {
        push_strings(&mut refs, image.get("src"), &Initiator::Image);
        push_strings(&mut refs, image.get("srcset"), &Initiator::Image);
    }
    for video in array(data, "videos") {
        push_strings(&mut refs, video.get("src"), &Initiator::Video);
    }
    for script in array(data, "scripts") {
        push_strings(&mut refs, script.get("src"), &Initiator::Script);
    }
    for stylesheet in array(data, "stylesheets") {
        push_strings(&mut refs, stylesheet.get("href"), &Initiator::Stylesheet);
    }
    push_strings(&mut refs, data.get("icons"), &Initiator::Image);
    for entry in array(data, "resourceEntries") {
        let kind = entry
            .get("initiatorType")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(name) = entry.get("name").and_then(Value::as_str) {
            refs.push((name.to_string(), Initiator::ResourceEntry(kind)));
        }
    }
    push_strings(
        &mut refs,
        data.get("openGraph").and_then(|og| og.get("image")),
        &Initiator::Image,
    );
    push_strings(
        &mut refs,
        data.get("twitter").and_then(|tw| tw.get("image")),
        &Initiator::Image,
    );

    refs
}

fn array<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Pushes a string, or every string of a (nested) array
fn push_strings(refs: &mut Vec<(String, Initiator)>, value: Option<&Value>, initiator: &Initiator) {
    match value {
        Some(Value::String(s)) => refs.push((s.clone(), initiator.clone())),
        Some(Value::Array(items)) => {
            for item in items {
                push_strings(refs, Some(item), initiator);
            }
        }
        _ => {}
    }
}
