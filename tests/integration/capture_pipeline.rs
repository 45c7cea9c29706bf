//! End-to-end run over a mocked sitemap, a fake browser and mocked assets
//!
//! The sitemap lists three pages and the navigation adds one more plus an
//! outbound link, so four pages are captured by two workers. Every page
//! references a telemetry pixel (excluded) and a logo served by the mock
//! server (downloaded).

mod common;

use common::{test_config, FakeDriver, FakeSite};
use serde_json::{json, Value};
use site_snapshot::crawler::Pipeline;
use site_snapshot::output::RunLayout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGES: [&str; 4] = [
    "https://www.site.test/",
    "https://www.site.test/about",
    "https://www.site.test/contact",
    "https://www.site.test/shop",
];

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn extraction(url: &str, title: &str, logo: &str) -> Value {
    json!({
        "url": url,
        "title": title,
        "canonical": url,
        "headings": {"h1": [title]},
        "counts": {"images": 2, "links": 5},
        "images": [
            {"src": logo, "srcset": []},
            {"src": "https://www.google-analytics.com/collect?v=1&t=pageview"},
        ],
        "resourceEntries": [
            {"name": "https://www.site.test/api/cart", "initiatorType": "fetch"},
        ],
    })
}

fn live(url: &str, title: &str) -> Value {
    json!({"title": title, "canonical": url, "h1": [title], "imageCount": 2})
}

async fn mock_site() -> (MockServer, String) {
    let server = MockServer::start().await;
    let sitemap = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://www.site.test/</loc></url>
  <url><loc>https://www.site.test/about/</loc></url>
  <url><loc>http://www.site.test/shop</loc></url>
</urlset>"#;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"\x89PNG logo".to_vec(), "image/png"),
        )
        .mount(&server)
        .await;
    let logo = format!("{}/static/logo.png", server.uri());
    (server, logo)
}

fn fake_site(logo: &str) -> FakeSite {
    let mut site = FakeSite {
        nav: vec![
            "https://www.site.test/about".to_string(),
            "https://www.site.test/contact#team".to_string(),
            "https://elsewhere.test/partner".to_string(),
        ],
        ..FakeSite::default()
    };
    for (index, url) in PAGES.iter().enumerate() {
        let title = format!("Page {}", index);
        site.pages.insert(url.to_string(), extraction(url, &title, logo));
        site.live.insert(url.to_string(), live(url, &title));
    }
    // The shop title changed after capture; its heading did not
    let mut shop = live(PAGES[3], "Page 3");
    shop["title"] = json!("Shop (sale!)");
    site.live.insert(PAGES[3].to_string(), shop);
    site
}

#[tokio::test]
async fn test_full_snapshot_run() {
    let (server, logo) = mock_site().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &format!("{}/sitemap.xml", server.uri()), 2);
    let layout = RunLayout::create(dir.path().join("run")).unwrap();
    let driver = FakeDriver::new(fake_site(&logo));

    let pipeline = Pipeline::new(config, driver.clone(), layout.clone()).unwrap();
    let summary = pipeline.run().await.unwrap();

    // Inventory: 3 sitemap + 2 internal nav with one overlap
    assert_eq!(summary.inventory.sitemap_urls, 3);
    assert_eq!(summary.inventory.nav_urls, 2);
    assert_eq!(summary.inventory.canonical_urls, 4);
    assert_eq!(
        std::fs::read_to_string(layout.manifest("all_urls.txt")).unwrap(),
        format!("{}\n", PAGES.join("\n"))
    );

    // Capture: round-robin over two workers, ledger sorted by URL
    let crawl = read_json(&layout.manifest("crawl_results.json"));
    let pages = crawl["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 4);
    let ledger: Vec<(&str, u64, &str)> = pages
        .iter()
        .map(|p| {
            (
                p["url"].as_str().unwrap(),
                p["worker"].as_u64().unwrap(),
                p["status"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        ledger,
        vec![
            (PAGES[0], 1, "success"),
            (PAGES[1], 2, "success"),
            (PAGES[2], 1, "success"),
            (PAGES[3], 2, "success"),
        ]
    );
    for page in pages {
        for key in ["jsonFile", "rawHtmlFile", "desktopScreenshot", "mobileScreenshot"] {
            let rel = page[key].as_str().unwrap();
            assert!(layout.resolve(rel).is_file(), "{} missing", rel);
        }
        let data = read_json(&layout.resolve(page["jsonFile"].as_str().unwrap()));
        assert_eq!(data["_capture"]["requestedUrl"], page["url"]);
    }
    assert_eq!(summary.crawl.success, 4);
    assert_eq!(summary.crawl.failed, 0);

    // Assets: logo included once, telemetry and API traffic excluded
    assert_eq!(
        std::fs::read_to_string(layout.manifest("asset_urls.txt")).unwrap(),
        format!("{}\n", logo)
    );
    let rules = read_json(&layout.manifest("asset_filter_rules.json"));
    assert_eq!(rules["exclusions"]["runtime_host_blocklist"], 1);
    assert_eq!(rules["exclusions"]["internal_api_endpoint"], 1);
    assert_eq!(rules["rules"].as_array().unwrap().len(), 8);

    let manifest = read_json(&layout.manifest("assets_manifest.json"));
    assert_eq!(manifest["summary"]["total"], 1);
    assert_eq!(manifest["summary"]["success"], 1);
    let asset = &manifest["assets"][0];
    assert_eq!(asset["httpStatus"], 200);
    assert_eq!(asset["contentType"], "image/png");
    let file = asset["file"].as_str().unwrap();
    assert!(file.ends_with("/static/logo.png"), "{}", file);
    assert_eq!(std::fs::read(layout.resolve(file)).unwrap(), b"\x89PNG logo");
    assert_eq!(summary.assets.queued, 1);
    assert_eq!(summary.assets.downloaded, 1);

    // Verification: only the shop drifted
    let report = read_json(&layout.manifest("verification_report.json"));
    assert_eq!(
        report["summary"],
        json!({"totalChecked": 4, "matches": 3, "mismatches": 1, "errors": 0})
    );
    let shop = report["details"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["url"] == PAGES[3])
        .unwrap();
    assert_eq!(shop["status"], "mismatch");
    assert_eq!(shop["fields"], json!(["title"]));
    assert_eq!(shop["live"]["title"], "Shop (sale!)");
    assert_eq!(summary.verification.mismatches, 1);

    // Summary and logs
    let written = read_json(&layout.manifest("summary.json"));
    assert_eq!(written["site"], "https://www.site.test/");
    assert_eq!(written["inventory"]["canonicalUrls"], 4);
    assert!(layout.manifest("summary.md").is_file());
    assert!(layout.manifest("verification_live_snapshots.json").is_file());
    let progress = std::fs::read_to_string(layout.progress_log()).unwrap();
    assert_eq!(progress.matches("[capture] worker=").count(), 4);
    assert_eq!(progress.matches("[verify] worker=").count(), 4);
    assert_eq!(progress.matches("[assets] worker=").count(), 1);

    let mut sessions = driver.sessions();
    sessions.sort();
    assert_eq!(
        sessions,
        vec!["capture-1", "capture-2", "nav-inventory", "verify-1", "verify-2"]
    );
}

#[tokio::test]
async fn test_failed_pages_are_recorded_not_fatal() {
    let (server, logo) = mock_site().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path(), &format!("{}/sitemap.xml", server.uri()), 3);
    let layout = RunLayout::create(dir.path().join("run")).unwrap();

    // No extraction output for /about, and nothing live for /contact
    let mut site = fake_site(&logo);
    site.pages.remove(PAGES[1]);
    site.live.remove(PAGES[2]);
    let pipeline = Pipeline::new(config, FakeDriver::new(site), layout.clone()).unwrap();

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.crawl.success, 3);
    assert_eq!(summary.crawl.failed, 1);
    assert_eq!(summary.verification.total_checked, 4);
    assert_eq!(summary.verification.errors, 2);

    let report = read_json(&layout.manifest("verification_report.json"));
    let status_of = |url: &str| {
        report["details"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["url"] == url)
            .map(|d| d["status"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(status_of(PAGES[1]), "missing_capture_record");
    assert_eq!(status_of(PAGES[2]), "verify_error");

    let md = std::fs::read_to_string(layout.manifest("summary.md")).unwrap();
    assert!(md.contains("## Failed Pages"));
    assert!(md.contains(PAGES[1]));
}
