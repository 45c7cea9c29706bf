//! Asset downloads

use crate::assets::path::asset_target_path;
use crate::config::AssetsConfig;
use crate::crawler::{build_http_client, fetch_url, Ledgered, ProgressLine, ProgressSink};
use crate::output::RunLayout;
use crate::state::ItemStatus;
use crate::url::CanonicalUrl;
use crate::{ItemError, ItemResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// One entry of `assets_manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub url: CanonicalUrl,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Path relative to the run root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: String,
    pub completed_at: String,
}

impl AssetRecord {
    fn started(url: &CanonicalUrl) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            url: url.clone(),
            status: ItemStatus::Error,
            http_status: None,
            content_type: None,
            bytes: None,
            sha256: None,
            file: None,
            error: None,
            started_at: now.clone(),
            completed_at: now,
        }
    }

    /// Error record for an asset its worker never got to
    pub fn worker_failed(url: &CanonicalUrl, message: &str) -> Self {
        let mut record = Self::started(url);
        record.error = Some(message.to_string());
        record
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl Ledgered for AssetRecord {
    fn ledger_key(&self) -> &str {
        self.url.as_str()
    }
}

/// Shared settings of the download workers
#[derive(Debug, Clone)]
pub struct AssetContext {
    pub layout: RunLayout,
    pub progress: ProgressSink,
    pub config: AssetsConfig,
}

/// Downloads one asset into the run's download tree
///
/// Never fails: network errors, non-2xx responses and write failures all
/// produce an `error` record.
pub async fn download_one(client: &Client, url: &CanonicalUrl, layout: &RunLayout) -> AssetRecord {
    let mut record = AssetRecord::started(url);

    match fetch_and_store(client, url, layout, &mut record).await {
        Ok(()) => record.status = ItemStatus::Success,
        Err(e) => {
            tracing::debug!("Download of {} failed: {}", url, e);
            record.error = Some(e.to_string());
        }
    }

    record.completed_at = chrono::Utc::now().to_rfc3339();
    record
}

async fn fetch_and_store(
    client: &Client,
    url: &CanonicalUrl,
    layout: &RunLayout,
    record: &mut AssetRecord,
) -> ItemResult<()> {
    let fetched = fetch_url(client, url.as_str())
        .await
        .map_err(|e| ItemError::Network(e.to_string()))?;
    record.http_status = Some(fetched.status);
    record.content_type = fetched.content_type.clone();
    if !fetched.is_success() {
        return Err(ItemError::HttpStatus {
            status: fetched.status,
        });
    }

    let target = asset_target_path(&layout.downloads_dir(), url, fetched.content_type.as_deref());
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ItemError::Persist {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(&target, &fetched.body)
        .await
        .map_err(|source| ItemError::Persist {
            path: target.clone(),
            source,
        })?;

    record.bytes = Some(fetched.body.len() as u64);
    record.sha256 = Some(hex::encode(Sha256::digest(&fetched.body)));
    record.file = Some(layout.relative(&target));
    Ok(())
}

/// Downloads one chunk of the asset queue with a client of its own
pub async fn asset_worker(
    ctx: Arc<AssetContext>,
    worker: usize,
    urls: Vec<CanonicalUrl>,
    tx: UnboundedSender<AssetRecord>,
) -> Result<(), String> {
    let client = build_http_client(&ctx.config)
        .map_err(|e| format!("cannot build HTTP client: {}", e))?;

    let total = urls.len();
    for (index, url) in urls.iter().enumerate() {
        let record = download_one(&client, url, &ctx.layout).await;

        ctx.progress.record(ProgressLine {
            phase: "assets",
            worker,
            unit: "asset",
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
