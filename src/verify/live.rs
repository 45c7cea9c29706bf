//! Light re-crawl of the live site

use crate::browser::{BrowserDriver, BrowserSession};
use crate::config::ViewportConfig;
use crate::crawler::{decode_page_object, Ledgered, ProgressLine, ProgressSink};
use crate::state::ItemStatus;
use crate::url::CanonicalUrl;
use crate::ItemResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// One live re-read, as stored in `verification_live_snapshots.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationItem {
    pub url: CanonicalUrl,
    pub worker: usize,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationItem {
    pub fn failed(worker: usize, url: &CanonicalUrl, message: &str) -> Self {
        Self {
            url: url.clone(),
            worker,
            status: ItemStatus::Error,
            live: None,
            error: Some(message.to_string()),
        }
    }
}

impl Ledgered for VerificationItem {
    fn ledger_key(&self) -> &str {
        self.url.as_str()
    }
}

/// Shared settings of the verification workers
#[derive(Debug, Clone)]
pub struct VerifyContext {
    pub progress: ProgressSink,
    pub verify_script: String,
    pub settle_ms: u64,
    pub desktop: ViewportConfig,
}

/// Re-reads every URL of one chunk through the session `verify-<worker>`
pub async fn verify_worker<D: BrowserDriver>(
    driver: Arc<D>,
    ctx: Arc<VerifyContext>,
    worker: usize,
    urls: Vec<CanonicalUrl>,
    tx: UnboundedSender<VerificationItem>,
) -> Result<(), String> {
    let mut session = driver
        .session(&format!("verify-{}", worker))
        .map_err(|e| e.to_string())?;

    let total = urls.len();
    for (index, url) in urls.into_iter().enumerate() {
        let item = match verify_page(&mut session, &ctx, &url).await {
            Ok(live) => VerificationItem {
                url,
                worker,
                status: ItemStatus::Success,
                live: Some(live),
                error: None,
            },
            Err(e) => VerificationItem::failed(worker, &url, &e.to_string()),
        };

        ctx.progress.record(ProgressLine {
            phase: "verify",
            worker,
            unit: "page",
            index: index + 1,
            total,
            status: item.status.as_str(),
            url: item.url.as_str(),
        });

        tx.send(item)
            .map_err(|_| "ledger channel closed".to_string())?;
    }

    Ok(())
}

async fn verify_page<S: BrowserSession>(
    session: &mut S,
    ctx: &VerifyContext,
    url: &CanonicalUrl,
) -> ItemResult<Map<String, Value>> {
    session
        .set_viewport(ctx.desktop.width, ctx.desktop.height)
        .await?;
    session.open(url.as_str()).await?;
    session.wait(ctx.settle_ms).await?;
    let raw = session.eval(&ctx.verify_script).await?;
    decode_page_object(&raw)
}
