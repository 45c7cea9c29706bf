//! Markdown report generation
//!
//! `manifests/summary.md` restates `summary.json` for people and lists every
//! failed page, failed asset and verification issue.

use crate::assets::AssetRecord;
use crate::crawler::PageRecord;
use crate::output::manifest::write_text;
use crate::output::summary::RunSummary;
use crate::verify::{DiffStatus, MismatchReport};
use crate::SnapshotResult;
use std::path::Path;

/// Writes the markdown report to `output_path`
pub fn write_markdown_report(
    output_path: &Path,
    summary: &RunSummary,
    pages: &[PageRecord],
    assets: &[AssetRecord],
    report: &MismatchReport,
) -> SnapshotResult<()> {
    let markdown = format_markdown_report(summary, pages, assets, report);
    write_text(output_path, &markdown)
}

/// Formats the run as markdown
pub fn format_markdown_report(
    summary: &RunSummary,
    pages: &[PageRecord],
    assets: &[AssetRecord],
    report: &MismatchReport,
) -> String {
    let mut md = String::new();

    md.push_str("# Site Snapshot Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", summary.site));
    md.push_str(&format!("- **Generated**: {}\n", summary.generated_at));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_seconds
    ));
    md.push_str(&format!("- **Output**: {}\n\n", summary.output_dir));

    md.push_str("## Totals\n\n");
    md.push_str("| Phase | Metric | Count |\n");
    md.push_str("|-------|--------|-------|\n");
    md.push_str(&format!(
        "| Inventory | Sitemap URLs | {} |\n",
        summary.inventory.sitemap_urls
    ));
    md.push_str(&format!(
        "| Inventory | Navigation URLs | {} |\n",
        summary.inventory.nav_urls
    ));
    md.push_str(&format!(
        "| Inventory | Canonical URLs | {} |\n",
        summary.inventory.canonical_urls
    ));
    md.push_str(&format!("| Capture | Success | {} |\n", summary.crawl.success));
    md.push_str(&format!("| Capture | Failed | {} |\n", summary.crawl.failed));
    md.push_str(&format!("| Assets | Queued | {} |\n", summary.assets.queued));
    md.push_str(&format!(
        "| Assets | Downloaded | {} |\n",
        summary.assets.downloaded
    ));
    md.push_str(&format!("| Assets | Failed | {} |\n", summary.assets.failed));
    md.push_str(&format!(
        "| Verification | Checked | {} |\n",
        summary.verification.total_checked
    ));
    md.push_str(&format!(
        "| Verification | Matches | {} |\n",
        summary.verification.matches
    ));
    md.push_str(&format!(
        "| Verification | Mismatches | {} |\n",
        summary.verification.mismatches
    ));
    md.push_str(&format!(
        "| Verification | Errors | {} |\n\n",
        summary.verification.errors
    ));

    let failed_pages: Vec<&PageRecord> = pages.iter().filter(|p| !p.is_success()).collect();
    if !failed_pages.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Worker | Error |\n");
        md.push_str("|-----|--------|-------|\n");
        for page in failed_pages {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                page.url,
                page.worker,
                cell(page.error.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');
    }

    let failed_assets: Vec<&AssetRecord> = assets.iter().filter(|a| !a.is_success()).collect();
    if !failed_assets.is_empty() {
        md.push_str("## Failed Assets\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for asset in failed_assets {
            md.push_str(&format!(
                "| {} | {} |\n",
                asset.url,
                cell(asset.error.as_deref().unwrap_or(""))
            ));
        }
        md.push('\n');
    }

    let issues: Vec<_> = report
        .details
        .iter()
        .filter(|d| d.status != DiffStatus::Match)
        .collect();
    if !issues.is_empty() {
        md.push_str("## Verification Issues\n\n");
        md.push_str("| URL | Status | Details |\n");
        md.push_str("|-----|--------|---------|\n");
        for detail in issues {
            let info = if detail.fields.is_empty() {
                detail.error.clone().unwrap_or_default()
            } else {
                detail.fields.join(", ")
            };
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                detail.url,
                detail.status.as_str(),
                cell(&info)
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps a value on one table row
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::summary::{AssetCounts, CrawlCounts, InventoryCounts};
    use crate::url::{canonicalize_crawl_url, canonicalize_resource_url};
    use crate::verify::{DiffDetail, ReportSummary};

    fn summary() -> RunSummary {
        RunSummary {
            generated_at: "2024-03-09T14:05:07+00:00".to_string(),
            duration_seconds: 61.25,
            site: "https://www.example.com/".to_string(),
            inventory: InventoryCounts {
                sitemap_urls: 3,
                nav_urls: 2,
                canonical_urls: 4,
            },
            crawl: CrawlCounts {
                success: 3,
                failed: 1,
            },
            assets: AssetCounts {
                queued: 2,
                downloaded: 1,
                failed: 1,
            },
            verification: ReportSummary {
                total_checked: 3,
                matches: 1,
                mismatches: 1,
                errors: 1,
            },
            output_dir: "capture/run".to_string(),
        }
    }

    #[test]
    fn test_format_clean_run() {
        let md = format_markdown_report(&summary(), &[], &[], &MismatchReport::default());

        assert!(md.starts_with("# Site Snapshot Summary"));
        assert!(md.contains("- **Duration**: 61.25 seconds"));
        assert!(md.contains("| Inventory | Canonical URLs | 4 |"));
        assert!(md.contains("| Verification | Mismatches | 1 |"));
        assert!(!md.contains("## Failed Pages"));
        assert!(!md.contains("## Verification Issues"));
    }

    #[test]
    fn test_format_lists_failures() {
        let page = PageRecord::worker_failed(
            2,
            &canonicalize_crawl_url("https://www.example.com/shop").unwrap(),
            "open failed: a | b\nsecond line",
        );
        let asset = crate::assets::AssetRecord::worker_failed(
            &canonicalize_resource_url("https://cdn.test/a.png").unwrap(),
            "HTTP 404",
        );
        let report = MismatchReport {
            summary: ReportSummary::default(),
            details: vec![
                DiffDetail {
                    url: canonicalize_crawl_url("https://www.example.com/").unwrap(),
                    status: DiffStatus::Match,
                    fields: vec![],
                    captured: None,
                    live: None,
                    error: None,
                },
                DiffDetail {
                    url: canonicalize_crawl_url("https://www.example.com/about").unwrap(),
                    status: DiffStatus::Mismatch,
                    fields: vec!["title".to_string(), "h1".to_string()],
                    captured: None,
                    live: None,
                    error: None,
                },
            ],
        };

        let md = format_markdown_report(&summary(), &[page], &[asset], &report);

        assert!(md.contains("## Failed Pages"));
        assert!(md.contains("| https://www.example.com/shop | 2 | open failed: a \\| b second line |"));
        assert!(md.contains("| https://cdn.test/a.png | HTTP 404 |"));
        assert!(md.contains("| https://www.example.com/about | mismatch | title, h1 |"));
        assert!(!md.contains("| https://www.example.com/ | match"));
    }

    #[test]
    fn test_write_markdown_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifests").join("summary.md");
        write_markdown_report(&path, &summary(), &[], &[], &MismatchReport::default()).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().contains("Site Snapshot Summary"));
    }
}
