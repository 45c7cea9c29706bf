//! Page capture
//!
//! One capture drives a browser session through a fixed sequence: desktop
//! viewport, navigation, settle delay, desktop screenshot, raw HTML, page
//! extraction, mobile screenshot, and finally the page JSON with its
//! `_capture` block. The first failing step aborts the page.

use crate::browser::{decode_eval_output, BrowserDriver, BrowserSession};
use crate::config::ViewportConfig;
use crate::crawler::pool::Ledgered;
use crate::crawler::progress::{ProgressLine, ProgressSink};
use crate::inventory::json_kind;
use crate::output::RunLayout;
use crate::state::CaptureState;
use crate::url::{page_id_from_url, CanonicalUrl};
use crate::{ItemError, ItemResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Ledger entry for one crawl URL, as stored in `crawl_results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub worker: usize,
    pub url: CanonicalUrl,
    pub page_id: String,
    pub requested_at: String,
    pub status: CaptureState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    /// A fresh record, still `pending`
    pub fn new(worker: usize, url: CanonicalUrl) -> Self {
        Self {
            worker,
            page_id: page_id_from_url(&url),
            url,
            requested_at: chrono::Utc::now().to_rfc3339(),
            status: CaptureState::Pending,
            json_file: None,
            raw_html_file: None,
            desktop_screenshot: None,
            mobile_screenshot: None,
            final_url: None,
            title: None,
            counts: None,
            error: None,
        }
    }

    /// Error record for a URL its worker never got to
    pub fn worker_failed(worker: usize, url: &CanonicalUrl, message: &str) -> Self {
        let mut record = Self::new(worker, url.clone());
        record.finish(CaptureState::Error);
        record.error = Some(message.to_string());
        record
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn finish(&mut self, next: CaptureState) {
        if let Err(e) = self.status.transition(next) {
            tracing::error!("{} for {}", e, self.url);
        }
    }

    fn succeed(&mut self, captured: CapturedPage) {
        self.finish(CaptureState::Success);
        self.json_file = Some(captured.json_file);
        self.raw_html_file = Some(captured.raw_html_file);
        self.desktop_screenshot = Some(captured.desktop_screenshot);
        self.mobile_screenshot = Some(captured.mobile_screenshot);
        self.final_url = captured.final_url;
        self.title = captured.title;
        self.counts = Some(captured.counts);
    }

    fn fail(&mut self, error: &ItemError) {
        self.finish(CaptureState::Error);
        self.error = Some(error.to_string());
    }
}

impl Ledgered for PageRecord {
    fn ledger_key(&self) -> &str {
        self.url.as_str()
    }
}

/// Everything a capture worker shares with its siblings
#[derive(Debug, Clone)]
pub struct CaptureContext {
    pub layout: RunLayout,
    pub progress: ProgressSink,
    pub page_script: String,
    pub settle_ms: u64,
    pub desktop: ViewportConfig,
    pub mobile: ViewportConfig,
}

/// Artifacts and summary fields of a successful capture
#[derive(Debug)]
struct CapturedPage {
    json_file: String,
    raw_html_file: String,
    desktop_screenshot: String,
    mobile_screenshot: String,
    final_url: Option<String>,
    title: Option<String>,
    counts: Value,
}

/// Captures every URL of one chunk through the session `capture-<worker>`
///
/// Returns an error only when the session itself cannot be obtained or the
/// ledger channel is gone; page failures are recorded and the worker moves
/// on.
pub async fn capture_worker<D: BrowserDriver>(
    driver: Arc<D>,
    ctx: Arc<CaptureContext>,
    worker: usize,
    urls: Vec<CanonicalUrl>,
    tx: UnboundedSender<PageRecord>,
) -> Result<(), String> {
    let session_name = format!("capture-{}", worker);
    let mut session = driver.session(&session_name).map_err(|e| e.to_string())?;

    let total = urls.len();
    for (index, url) in urls.into_iter().enumerate() {
        let mut record = PageRecord::new(worker, url);
        record.finish(CaptureState::Capturing);

        match capture_page(&mut session, &ctx, worker, &record).await {
            Ok(captured) => record.succeed(captured),
            Err(e) => {
                tracing::debug!("Capture of {} failed: {}", record.url, e);
                record.fail(&e);
            }
        }

        ctx.progress.record(ProgressLine {
            phase: "capture",
            worker,
            unit: "page",
            index: index + 1,
            total,
            status: record.status.as_str(),
            url: record.url.as_str(),
        });

        tx.send(record)
            .map_err(|_| "ledger channel closed".to_string())?;
    }

    Ok(())
}

async fn capture_page<S: BrowserSession>(
    session: &mut S,
    ctx: &CaptureContext,
    worker: usize,
    record: &PageRecord,
) -> ItemResult<CapturedPage> {
    let layout = &ctx.layout;
    let page_id = record.page_id.as_str();
    let desktop_png = layout.desktop_screenshot(page_id);
    let mobile_png = layout.mobile_screenshot(page_id);
    let html_file = layout.raw_html(page_id);
    let json_file = layout.page_json(page_id);

    session
        .set_viewport(ctx.desktop.width, ctx.desktop.height)
        .await?;
    session.open(record.url.as_str()).await?;
    session.wait(ctx.settle_ms).await?;
    session.screenshot(&desktop_png).await?;

    let mut html = session.html().await?;
    if !html.ends_with('\n') {
        html.push('\n');
    }
    persist(&html_file, html.as_bytes()).await?;

    let raw = session.eval(&ctx.page_script).await?;
    let mut data = decode_page_object(&raw)?;

    session.set_viewport(ctx.mobile.width, ctx.mobile.height).await?;
    session.screenshot(&mobile_png).await?;
    session
        .set_viewport(ctx.desktop.width, ctx.desktop.height)
        .await?;

    let captured = CapturedPage {
        json_file: layout.relative(&json_file),
        raw_html_file: layout.relative(&html_file),
        desktop_screenshot: layout.relative(&desktop_png),
        mobile_screenshot: layout.relative(&mobile_png),
        final_url: data.get("url").and_then(Value::as_str).map(str::to_string),
        title: data.get("title").and_then(Value::as_str).map(str::to_string),
        counts: data.get("counts").cloned().unwrap_or_else(|| json!({})),
    };

    data.insert(
        "_capture".to_string(),
        json!({
            "requestedUrl": record.url.as_str(),
            "pageId": page_id,
            "worker": worker,
            "capturedAt": chrono::Utc::now().to_rfc3339(),
            "desktopScreenshot": captured.desktop_screenshot,
            "mobileScreenshot": captured.mobile_screenshot,
            "rawHtmlFile": captured.raw_html_file,
        }),
    );

    let mut text = serde_json::to_string_pretty(&Value::Object(data))
        .map_err(|e| ItemError::DataShape(e.to_string()))?;
    text.push('\n');
    persist(&json_file, text.as_bytes()).await?;

    Ok(captured)
}

/// Decodes extraction output that must be a JSON object
pub(crate) fn decode_page_object(raw: &str) -> ItemResult<Map<String, Value>> {
    match decode_eval_output(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ItemError::DataShape(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ItemError::DataShape(format!("output is not JSON: {}", e))),
    }
}

async fn persist(path: &Path, bytes: &[u8]) -> ItemResult<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ItemError::Persist {
            path: path.to_path_buf(),
            source,
        })
}
