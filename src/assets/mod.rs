//! Asset discovery and mirroring
//!
//! Discovery scans captured page JSON for referenced resources and keeps the
//! ones the classifier includes. Mirroring downloads the sorted queue over a
//! pool of workers, each with its own HTTP client, into
//! `assets/downloads/<host>/<path...>`.

mod discover;
mod download;
mod path;

pub use discover::{discover_assets, AssetUrl, Discovery, Initiator};
pub use download::{asset_worker, download_one, AssetContext, AssetRecord};
pub use path::{asset_target_path, sanitize_segment};

use serde::{Deserialize, Serialize};

/// Success/failure counts over the download ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

impl AssetSummary {
    pub fn from_records(records: &[AssetRecord]) -> Self {
        let success = records.iter().filter(|r| r.is_success()).count();
        Self {
            total: records.len(),
            success,
            failed: records.len() - success,
        }
    }
}

/// Contents of `assets_manifest.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsManifest {
    pub generated_at: String,
    pub summary: AssetSummary,
    pub assets: Vec<AssetRecord>,
}

impl AssetsManifest {
    pub fn new(assets: Vec<AssetRecord>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: AssetSummary::from_records(&assets),
            assets,
        }
    }
}
