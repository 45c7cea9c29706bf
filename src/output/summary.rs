//! Run summary and ledger documents

use crate::assets::AssetRecord;
use crate::crawler::PageRecord;
use crate::inventory::Inventory;
use crate::verify::{ReportSummary, VerificationItem};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Contents of `crawl_results.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResults {
    pub generated_at: String,
    pub pages: Vec<PageRecord>,
}

impl CrawlResults {
    pub fn new(pages: Vec<PageRecord>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            pages,
        }
    }
}

/// Contents of `verification_live_snapshots.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshots {
    pub pages: Vec<VerificationItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCounts {
    pub sitemap_urls: usize,
    pub nav_urls: usize,
    pub canonical_urls: usize,
}

impl From<&Inventory> for InventoryCounts {
    fn from(inventory: &Inventory) -> Self {
        Self {
            sitemap_urls: inventory.sitemap.len(),
            nav_urls: inventory.nav.len(),
            canonical_urls: inventory.all.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCounts {
    pub success: usize,
    pub failed: usize,
}

impl CrawlCounts {
    pub fn from_records(pages: &[PageRecord]) -> Self {
        let success = pages.iter().filter(|p| p.is_success()).count();
        Self {
            success,
            failed: pages.len() - success,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCounts {
    pub queued: usize,
    pub downloaded: usize,
    pub failed: usize,
}

impl AssetCounts {
    pub fn from_records(queued: usize, records: &[AssetRecord]) -> Self {
        let downloaded = records.iter().filter(|r| r.is_success()).count();
        Self {
            queued,
            downloaded,
            failed: records.len() - downloaded,
        }
    }
}

/// Contents of `summary.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub generated_at: String,
    pub duration_seconds: f64,
    pub site: String,
    pub inventory: InventoryCounts,
    pub crawl: CrawlCounts,
    pub assets: AssetCounts,
    pub verification: ReportSummary,
    pub output_dir: String,
}

impl RunSummary {
    /// Percentage of crawl URLs captured successfully
    pub fn capture_success_rate(&self) -> f64 {
        let total = self.crawl.success + self.crawl.failed;
        if total == 0 {
            return 0.0;
        }
        (self.crawl.success as f64 / total as f64) * 100.0
    }
}

/// Elapsed seconds rounded to two decimals
pub fn round_duration(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

/// Prints the final summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Snapshot Summary ===\n");

    println!("Site: {}", summary.site);
    println!("Output: {}", summary.output_dir);
    println!("Duration: {:.2}s", summary.duration_seconds);
    println!();

    println!("Inventory:");
    println!("  Sitemap URLs: {}", summary.inventory.sitemap_urls);
    println!("  Navigation URLs: {}", summary.inventory.nav_urls);
    println!("  Canonical URLs: {}", summary.inventory.canonical_urls);
    println!();

    println!("Capture:");
    println!(
        "  Success: {} ({:.1}%)",
        summary.crawl.success,
        summary.capture_success_rate()
    );
    println!("  Failed: {}", summary.crawl.failed);
    println!();

    println!("Assets:");
    println!("  Queued: {}", summary.assets.queued);
    println!("  Downloaded: {}", summary.assets.downloaded);
    println!("  Failed: {}", summary.assets.failed);
    println!();

    println!("Verification:");
    println!("  Checked: {}", summary.verification.total_checked);
    println!("  Matches: {}", summary.verification.matches);
    println!("  Mismatches: {}", summary.verification.mismatches);
    println!("  Errors: {}", summary.verification.errors);
}
