//! Output module for run artifacts and reports
//!
//! This module handles:
//! - The run directory layout
//! - Writing and reading JSON and list manifests
//! - The run summary (`summary.json`, stdout)
//! - The markdown report (`summary.md`)

mod layout;
mod manifest;
mod markdown;
mod summary;

pub use layout::RunLayout;
pub use manifest::{read_json, write_json, write_lines, write_text};
pub use markdown::{format_markdown_report, write_markdown_report};
pub use summary::{
    print_summary, round_duration, AssetCounts, CrawlCounts, CrawlResults, InventoryCounts,
    LiveSnapshots, RunSummary,
};

/// File names under `manifests/`
pub mod names {
    pub const SITEMAP_XML: &str = "sitemap.xml";
    pub const SITEMAP_URLS: &str = "sitemap_urls.txt";
    pub const NAV_URLS: &str = "nav_urls.txt";
    pub const ALL_URLS: &str = "all_urls.txt";
    pub const CRAWL_RESULTS: &str = "crawl_results.json";
    pub const ASSET_URLS: &str = "asset_urls.txt";
    pub const ASSET_FILTER_RULES: &str = "asset_filter_rules.json";
    pub const ASSETS_MANIFEST: &str = "assets_manifest.json";
    pub const LIVE_SNAPSHOTS: &str = "verification_live_snapshots.json";
    pub const VERIFICATION_REPORT: &str = "verification_report.json";
    pub const SUMMARY_JSON: &str = "summary.json";
    pub const SUMMARY_MD: &str = "summary.md";
}
