//! Live-versus-capture diff
//!
//! Compares four fields of each live re-read against the stored page JSON:
//! the trimmed title, the canonical link (canonicalized), the ordered list
//! of non-empty `h1` texts, and the image count.

use crate::crawler::PageRecord;
use crate::output::RunLayout;
use crate::state::ItemStatus;
use crate::url::{canonicalize_resource_url, CanonicalUrl};
use crate::verify::VerificationItem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-URL verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Match,
    Mismatch,
    VerifyError,
    MissingCaptureRecord,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffStatus::Match => "match",
            DiffStatus::Mismatch => "mismatch",
            DiffStatus::VerifyError => "verify_error",
            DiffStatus::MissingCaptureRecord => "missing_capture_record",
        }
    }
}

/// The compared values of one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedFields {
    pub title: Option<String>,
    pub canonical: Option<String>,
    pub h1: Vec<String>,
    pub image_count: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffDetail {
    pub url: CanonicalUrl,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<ComparedFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<ComparedFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_checked: usize,
    pub matches: usize,
    pub mismatches: usize,
    /// `verify_error` plus `missing_capture_record`
    pub errors: usize,
}

/// Contents of `verification_report.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MismatchReport {
    pub summary: ReportSummary,
    pub details: Vec<DiffDetail>,
}

/// Diffs every live item against its capture
///
/// Each item yields exactly one detail, in item order.
pub fn compare_live_to_capture(
    pages: &[PageRecord],
    items: &[VerificationItem],
    layout: &RunLayout,
) -> MismatchReport {
    let captured_by_url: HashMap<&str, &PageRecord> = pages
        .iter()
        .filter(|p| p.is_success())
        .map(|p| (p.url.as_str(), p))
        .collect();

    let mut summary = ReportSummary {
        total_checked: items.len(),
        ..ReportSummary::default()
    };
    let mut details = Vec::with_capacity(items.len());

    for item in items {
        let detail = diff_item(item, captured_by_url.get(item.url.as_str()).copied(), layout);
        match detail.status {
            DiffStatus::Match => summary.matches += 1,
            DiffStatus::Mismatch => summary.mismatches += 1,
            DiffStatus::VerifyError | DiffStatus::MissingCaptureRecord => summary.errors += 1,
        }
        details.push(detail);
    }

    MismatchReport { summary, details }
}

fn diff_item(
    item: &VerificationItem,
    record: Option<&PageRecord>,
    layout: &RunLayout,
) -> DiffDetail {
    let mut detail = DiffDetail {
        url: item.url.clone(),
        status: DiffStatus::Match,
        fields: Vec::new(),
        captured: None,
        live: None,
        error: None,
    };

    let live = match (&item.status, &item.live) {
        (ItemStatus::Success, Some(live)) => live,
        _ => {
            detail.status = DiffStatus::VerifyError;
            detail.error = Some(
                item.error
                    .clone()
                    .unwrap_or_else(|| "live snapshot missing".to_string()),
            );
            return detail;
        }
    };

    let captured = match record.map(|r| load_captured(r, layout)) {
        Some(Ok(captured)) => captured,
        Some(Err(error)) => {
            detail.status = DiffStatus::MissingCaptureRecord;
            detail.error = Some(error);
            return detail;
        }
        None => {
            detail.status = DiffStatus::MissingCaptureRecord;
            return detail;
        }
    };

    let captured_h1 = clean_headings(captured.get("headings").and_then(|h| h.get("h1")));
    let live_h1 = clean_headings(live.get("h1"));
    let captured_images = captured.get("counts").and_then(|c| c.get("images"));
    let live_images = live.get("imageCount");

    if trimmed_text(captured.get("title")) != trimmed_text(live.get("title")) {
        detail.fields.push("title".to_string());
    }
    if canonical_link(captured.get("canonical")) != canonical_link(live.get("canonical")) {
        detail.fields.push("canonical".to_string());
    }
    if captured_h1 != live_h1 {
        detail.fields.push("h1".to_string());
    }
    if captured_images.and_then(Value::as_u64) != live_images.and_then(Value::as_u64) {
        detail.fields.push("imageCount".to_string());
    }

    if !detail.fields.is_empty() {
        detail.status = DiffStatus::Mismatch;
        detail.captured = Some(ComparedFields {
            title: raw_text(captured.get("title")),
            canonical: raw_text(captured.get("canonical")),
            h1: captured_h1,
            image_count: captured_images.cloned(),
        });
        detail.live = Some(ComparedFields {
            title: raw_text(live.get("title")),
            canonical: raw_text(live.get("canonical")),
            h1: live_h1,
            image_count: live_images.cloned(),
        });
    }

    detail
}

/// Reads the page JSON a capture record points at
fn load_captured(record: &PageRecord, layout: &RunLayout) -> Result<Map<String, Value>, String> {
    let recorded = record
        .json_file
        .as_deref()
        .ok_or_else(|| "capture record has no page JSON".to_string())?;
    let path = layout.resolve(recorded);
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    match serde_json::from_str(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!("{} is not a JSON object", path.display())),
        Err(e) => Err(format!("cannot parse {}: {}", path.display(), e)),
    }
}

fn raw_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// Trimmed string value; missing or non-string counts as empty
fn trimmed_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Canonical form of a link; missing or invalid links compare as absent
fn canonical_link(value: Option<&Value>) -> Option<CanonicalUrl> {
    value
        .and_then(Value::as_str)
        .and_then(|raw| canonicalize_resource_url(raw).ok())
}

/// Trimmed, non-empty heading texts in document order
fn clean_headings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
