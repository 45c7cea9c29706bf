//! Re-verification of an existing run directory

mod common;

use common::{test_config, FakeDriver, FakeSite};
use serde_json::{json, Value};
use site_snapshot::crawler::{run_verify_only, PageRecord, Pipeline};
use site_snapshot::output::{
    write_json, write_lines, AssetCounts, CrawlCounts, CrawlResults, InventoryCounts, RunLayout,
    RunSummary,
};
use site_snapshot::state::CaptureState;
use site_snapshot::url::canonicalize_crawl_url;
use site_snapshot::verify::ReportSummary;
use site_snapshot::{ConfigError, SnapshotError};

const HOME: &str = "https://www.site.test/";
const ABOUT: &str = "https://www.site.test/about";

/// Writes a captured page the way the capture phase does
fn captured(layout: &RunLayout, worker: usize, url: &str, title: &str) -> PageRecord {
    let mut record = PageRecord::new(worker, canonicalize_crawl_url(url).unwrap());
    let path = layout.page_json(&record.page_id);
    let page = json!({
        "url": url,
        "title": title,
        "canonical": url,
        "headings": {"h1": [title]},
        "counts": {"images": 1},
    });
    std::fs::write(&path, serde_json::to_string_pretty(&page).unwrap()).unwrap();
    record.status = CaptureState::Success;
    record.json_file = Some(layout.relative(&path));
    record.title = Some(title.to_string());
    record
}

fn live(url: &str, title: &str) -> Value {
    json!({"title": title, "canonical": url, "h1": [title], "imageCount": 1})
}

fn previous_summary(layout: &RunLayout) -> RunSummary {
    RunSummary {
        generated_at: "2026-01-02T03:04:05+00:00".to_string(),
        duration_seconds: 42.5,
        site: HOME.to_string(),
        inventory: InventoryCounts {
            sitemap_urls: 2,
            nav_urls: 1,
            canonical_urls: 2,
        },
        crawl: CrawlCounts {
            success: 2,
            failed: 0,
        },
        assets: AssetCounts {
            queued: 7,
            downloaded: 6,
            failed: 1,
        },
        verification: ReportSummary {
            total_checked: 2,
            matches: 2,
            mismatches: 0,
            errors: 0,
        },
        output_dir: layout.root().display().to_string(),
    }
}

/// A finished run with two captured pages; the live about page has drifted
fn finished_run(dir: &std::path::Path) -> (RunLayout, FakeSite) {
    let layout = RunLayout::create(dir.join("run")).unwrap();
    let pages = vec![
        captured(&layout, 1, HOME, "Home"),
        captured(&layout, 2, ABOUT, "About"),
    ];
    write_json(
        &layout.manifest("crawl_results.json"),
        &CrawlResults::new(pages),
    )
    .unwrap();

    let mut site = FakeSite::default();
    site.live.insert(HOME.to_string(), live(HOME, "Home"));
    site.live.insert(ABOUT.to_string(), live(ABOUT, "About us"));
    (layout, site)
}

#[tokio::test]
async fn test_verify_only_updates_existing_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (layout, site) = finished_run(dir.path());
    write_json(&layout.manifest("summary.json"), &previous_summary(&layout)).unwrap();

    let config = test_config(dir.path(), "https://www.site.test/sitemap.xml", 2);
    let driver = FakeDriver::new(site);
    let pipeline = Pipeline::new(config, driver.clone(), layout.clone()).unwrap();

    let summary = pipeline.verify_only().await.unwrap();

    assert_eq!(
        summary.verification,
        ReportSummary {
            total_checked: 2,
            matches: 1,
            mismatches: 1,
            errors: 0,
        }
    );
    // Everything but the verification block is carried over
    let previous = previous_summary(&layout);
    assert_eq!(summary.inventory, previous.inventory);
    assert_eq!(summary.assets, previous.assets);
    assert_eq!(summary.duration_seconds, 42.5);
    assert_ne!(summary.generated_at, previous.generated_at);

    let report: Value = serde_json::from_str(
        &std::fs::read_to_string(layout.manifest("verification_report.json")).unwrap(),
    )
    .unwrap();
    let about = report["details"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["url"] == ABOUT)
        .unwrap();
    assert_eq!(about["fields"], json!(["title", "h1"]));

    let written: Value = serde_json::from_str(
        &std::fs::read_to_string(layout.manifest("summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["verification"]["mismatches"], 1);
    assert_eq!(written["assets"]["queued"], 7);
    assert!(std::fs::read_to_string(layout.manifest("summary.md"))
        .unwrap()
        .contains("## Verification Issues"));

    // Only verify sessions were opened; nothing was recaptured
    let mut sessions = driver.sessions();
    sessions.sort();
    assert_eq!(sessions, vec!["verify-1", "verify-2"]);
    assert!(!driver.log().iter().any(|line| line.contains("screenshot")));
}

#[tokio::test]
async fn test_verify_only_rebuilds_summary_from_lists() {
    let dir = tempfile::tempdir().unwrap();
    let (layout, site) = finished_run(dir.path());
    write_lines(&layout.manifest("sitemap_urls.txt"), &[HOME, ABOUT]).unwrap();
    write_lines(&layout.manifest("nav_urls.txt"), &[ABOUT]).unwrap();

    let config = test_config(dir.path(), "https://www.site.test/sitemap.xml", 1);
    let pipeline = Pipeline::new(config, FakeDriver::new(site), layout.clone()).unwrap();

    let summary = pipeline.verify_only().await.unwrap();

    assert_eq!(
        summary.inventory,
        InventoryCounts {
            sitemap_urls: 2,
            nav_urls: 1,
            canonical_urls: 2,
        }
    );
    assert_eq!(summary.crawl.success, 2);
    assert_eq!(summary.assets, AssetCounts::default());
    assert_eq!(summary.verification.mismatches, 1);
    assert_eq!(summary.site, HOME);
    assert!(layout.manifest("summary.json").is_file());
}

#[tokio::test]
async fn test_verify_only_requires_crawl_results() {
    let dir = tempfile::tempdir().unwrap();
    let layout = RunLayout::create(dir.path().join("run")).unwrap();
    let config = test_config(dir.path(), "https://www.site.test/sitemap.xml", 1);
    let pipeline = Pipeline::new(config, FakeDriver::new(FakeSite::default()), layout).unwrap();

    let result = pipeline.verify_only().await;

    assert!(matches!(result, Err(SnapshotError::Read { .. })));
}

#[tokio::test]
async fn test_run_verify_only_needs_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), "https://www.site.test/sitemap.xml", 1);
    assert!(config.output.dir.is_none());

    let result = run_verify_only(config).await;

    assert!(matches!(
        result,
        Err(SnapshotError::Config(ConfigError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_run_verify_only_rejects_non_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), "https://www.site.test/sitemap.xml", 1);
    config.output.dir = Some(dir.path().join("nowhere"));

    let result = run_verify_only(config).await;

    assert!(matches!(result, Err(SnapshotError::Setup { .. })));
}
