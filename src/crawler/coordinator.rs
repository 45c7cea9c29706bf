//! Run coordinator - phase orchestration
//!
//! A run executes its phases strictly in order:
//! - Inventory: sitemap plus navigation links, canonicalized
//! - Capture: one browser session per worker
//! - Assets: discovery over the captured JSON, then concurrent downloads
//! - Verification: light re-crawl and diff against the capture
//!
//! Each phase writes its manifests before the next one starts, so a run that
//! is interrupted still leaves the ledgers of every finished phase behind.

use crate::assets::{
    asset_worker, discover_assets, AssetContext, AssetRecord, AssetsManifest, Discovery,
};
use crate::browser::{AgentBrowser, BrowserDriver};
use crate::classify::ResourceClassifier;
use crate::config::{Config, Scripts};
use crate::crawler::capture::{capture_worker, CaptureContext, PageRecord};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::pool::run_pool;
use crate::crawler::progress::ProgressSink;
use crate::inventory::{collect_nav_urls, fetch_sitemap, parse_sitemap, resolve, Inventory, NAV_SESSION};
use crate::output::{
    names, read_json, round_duration, write_json, write_lines, write_markdown_report,
    write_text, AssetCounts, CrawlCounts, CrawlResults, InventoryCounts, LiveSnapshots,
    RunLayout, RunSummary,
};
use crate::url::{CanonicalUrl, SiteHosts};
use crate::verify::{compare_live_to_capture, verify_worker, MismatchReport, VerificationItem, VerifyContext};
use crate::{ConfigError, SnapshotResult};
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

/// A configured run over one run directory
pub struct Pipeline<D: BrowserDriver> {
    config: Arc<Config>,
    driver: Arc<D>,
    scripts: Scripts,
    hosts: SiteHosts,
    classifier: ResourceClassifier,
    layout: RunLayout,
    progress: ProgressSink,
}

impl<D: BrowserDriver> Pipeline<D> {
    /// Prepares a run: loads the extraction scripts and opens the progress log
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `driver` - Browser driver used for navigation, capture and verification
    /// * `layout` - The run directory, already created or opened
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(SnapshotError)` - A script is unreadable or the log cannot be opened
    pub fn new(config: Config, driver: D, layout: RunLayout) -> SnapshotResult<Self> {
        let scripts = config.scripts.load()?;
        let hosts = config.site_hosts()?;
        let classifier = ResourceClassifier::new(hosts.clone()).with_extra_hosts(
            config.assets.extra_runtime_blocklist.iter(),
            config.assets.extra_static_allowlist.iter(),
        );
        let progress = ProgressSink::open(&layout.progress_log())?;

        Ok(Self {
            config: Arc::new(config),
            driver: Arc::new(driver),
            scripts,
            hosts,
            classifier,
            layout,
            progress,
        })
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Runs every phase and writes the summary
    pub async fn run(&self) -> SnapshotResult<RunSummary> {
        let started = Instant::now();
        tracing::info!(
            "Starting snapshot of {} into {}",
            self.config.site.url,
            self.layout.root().display()
        );

        let inventory = self.resolve_inventory().await?;
        let pages = self.capture(&inventory.all).await?;
        let (discovery, assets) = self.mirror_assets(&pages).await?;
        let report = self.verify(&inventory.all, &pages).await?;

        let summary = self.summarize(
            started,
            InventoryCounts::from(&inventory),
            &pages,
            AssetCounts::from_records(discovery.queue.len(), &assets),
            &report,
        );
        self.write_summary(&summary, &pages, &assets, &report)?;
        Ok(summary)
    }

    /// Builds the crawl inventory and writes the inventory manifests
    ///
    /// The sitemap is required; the navigation read is best effort.
    pub async fn resolve_inventory(&self) -> SnapshotResult<Inventory> {
        let client = build_http_client(&self.config.assets)?;
        let sitemap_url = self.config.sitemap_url()?;

        tracing::info!("Fetching sitemap {}", sitemap_url);
        let xml = fetch_sitemap(&client, &sitemap_url).await?;
        write_text(&self.layout.manifest(names::SITEMAP_XML), &xml)?;
        let sitemap_raw = parse_sitemap(&xml)?;

        let nav_raw = self.read_nav().await;

        let inventory = resolve(
            &sitemap_raw,
            &nav_raw,
            &self.hosts,
            &self.config.site.crawl_scheme,
        );

        write_lines(&self.layout.manifest(names::SITEMAP_URLS), &inventory.sitemap)?;
        write_lines(&self.layout.manifest(names::NAV_URLS), &inventory.nav)?;
        write_lines(&self.layout.manifest(names::ALL_URLS), &inventory.all)?;

        self.progress
            .note(&format!("[inventory] sitemap URLs: {}", inventory.sitemap.len()));
        self.progress
            .note(&format!("[inventory] nav URLs (internal): {}", inventory.nav.len()));
        self.progress
            .note(&format!("[inventory] total canonical URLs: {}", inventory.all.len()));

        Ok(inventory)
    }

    async fn read_nav(&self) -> Vec<String> {
        let mut session = match self.driver.session(NAV_SESSION) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Navigation links unavailable: {}", e);
                return Vec::new();
            }
        };

        match collect_nav_urls(&mut session, &self.config.site.url, &self.scripts.nav).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("Navigation links unavailable, using the sitemap only: {}", e);
                Vec::new()
            }
        }
    }

    /// Captures every URL and writes `crawl_results.json`
    pub async fn capture(&self, urls: &[CanonicalUrl]) -> SnapshotResult<Vec<PageRecord>> {
        let browser = &self.config.browser;
        let ctx = Arc::new(CaptureContext {
            layout: self.layout.clone(),
            progress: self.progress.clone(),
            page_script: self.scripts.page.clone(),
            settle_ms: browser.settle_ms,
            desktop: browser.desktop_viewport,
            mobile: browser.mobile_viewport,
        });

        let pages = run_pool(
            "capture",
            urls,
            self.config.workers.capture,
            |worker, chunk, tx| {
                capture_worker(Arc::clone(&self.driver), Arc::clone(&ctx), worker, chunk, tx)
            },
            PageRecord::worker_failed,
        )
        .await;

        let results = CrawlResults::new(pages);
        write_json(&self.layout.manifest(names::CRAWL_RESULTS), &results)?;

        let counts = CrawlCounts::from_records(&results.pages);
        self.progress.note(&format!(
            "[crawl] success={} failed={}",
            counts.success, counts.failed
        ));

        Ok(results.pages)
    }

    /// Discovers and downloads assets, writing the asset manifests
    pub async fn mirror_assets(
        &self,
        pages: &[PageRecord],
    ) -> SnapshotResult<(Discovery, Vec<AssetRecord>)> {
        let discovery = discover_assets(pages, &self.layout, &self.classifier);
        let urls = discovery.urls();

        write_lines(&self.layout.manifest(names::ASSET_URLS), &urls)?;
        write_json(
            &self.layout.manifest(names::ASSET_FILTER_RULES),
            &self.classifier.describe_rules(&discovery.exclusions),
        )?;
        self.progress.note(&format!(
            "[assets] unique URLs queued for download: {}",
            urls.len()
        ));

        let ctx = Arc::new(AssetContext {
            layout: self.layout.clone(),
            progress: self.progress.clone(),
            config: self.config.assets.clone(),
        });
        let records = run_pool(
            "assets",
            &urls,
            self.config.workers.assets,
            |worker, chunk, tx| asset_worker(Arc::clone(&ctx), worker, chunk, tx),
            |_, url, message| AssetRecord::worker_failed(url, message),
        )
        .await;

        let manifest = AssetsManifest::new(records);
        write_json(&self.layout.manifest(names::ASSETS_MANIFEST), &manifest)?;
        self.progress.note(&format!(
            "[assets] downloaded={} failed={}",
            manifest.summary.success, manifest.summary.failed
        ));

        Ok((discovery, manifest.assets))
    }

    /// Re-reads every URL live and diffs it against the capture
    pub async fn verify(
        &self,
        urls: &[CanonicalUrl],
        pages: &[PageRecord],
    ) -> SnapshotResult<MismatchReport> {
        let browser = &self.config.browser;
        let ctx = Arc::new(VerifyContext {
            progress: self.progress.clone(),
            verify_script: self.scripts.verify.clone(),
            settle_ms: browser.settle_ms,
            desktop: browser.desktop_viewport,
        });

        let items = run_pool(
            "verify",
            urls,
            self.config.workers.capture,
            |worker, chunk, tx| {
                verify_worker(Arc::clone(&self.driver), Arc::clone(&ctx), worker, chunk, tx)
            },
            VerificationItem::failed,
        )
        .await;

        let snapshots = LiveSnapshots { pages: items };
        write_json(&self.layout.manifest(names::LIVE_SNAPSHOTS), &snapshots)?;

        let report = compare_live_to_capture(pages, &snapshots.pages, &self.layout);
        write_json(&self.layout.manifest(names::VERIFICATION_REPORT), &report)?;
        self.progress.note(&format!(
            "[verify] matches={} mismatches={} errors={}",
            report.summary.matches, report.summary.mismatches, report.summary.errors
        ));

        Ok(report)
    }

    /// Repeats verification against the capture already in the run directory
    ///
    /// Only the verification manifests and the summary are rewritten.
    pub async fn verify_only(&self) -> SnapshotResult<RunSummary> {
        let started = Instant::now();
        let crawl: CrawlResults = read_json(&self.layout.manifest(names::CRAWL_RESULTS))?;

        let mut urls: Vec<CanonicalUrl> = crawl.pages.iter().map(|p| p.url.clone()).collect();
        urls.sort();
        urls.dedup();
        tracing::info!("Re-verifying {} URLs from {}", urls.len(), self.layout.root().display());

        let report = self.verify(&urls, &crawl.pages).await?;

        let assets_path = self.layout.manifest(names::ASSETS_MANIFEST);
        let assets = if assets_path.exists() {
            read_json::<AssetsManifest>(&assets_path)?.assets
        } else {
            Vec::new()
        };

        let summary_path = self.layout.manifest(names::SUMMARY_JSON);
        let summary = if summary_path.exists() {
            let mut previous: RunSummary = read_json(&summary_path)?;
            previous.generated_at = chrono::Utc::now().to_rfc3339();
            previous.verification = report.summary;
            previous
        } else {
            let inventory = InventoryCounts {
                sitemap_urls: self.count_lines(names::SITEMAP_URLS),
                nav_urls: self.count_lines(names::NAV_URLS),
                canonical_urls: urls.len(),
            };
            let queued = self.count_lines(names::ASSET_URLS).max(assets.len());
            self.summarize(
                started,
                inventory,
                &crawl.pages,
                AssetCounts::from_records(queued, &assets),
                &report,
            )
        };

        self.write_summary(&summary, &crawl.pages, &assets, &report)?;
        Ok(summary)
    }

    /// Entries of a list manifest; zero when it is missing
    fn count_lines(&self, name: &str) -> usize {
        std::fs::read_to_string(self.layout.manifest(name))
            .map(|text| text.lines().filter(|l| !l.trim().is_empty()).count())
            .unwrap_or(0)
    }

    fn summarize(
        &self,
        started: Instant,
        inventory: InventoryCounts,
        pages: &[PageRecord],
        assets: AssetCounts,
        report: &MismatchReport,
    ) -> RunSummary {
        RunSummary {
            generated_at: chrono::Utc::now().to_rfc3339(),
            duration_seconds: round_duration(started.elapsed()),
            site: self.config.site.url.clone(),
            inventory,
            crawl: CrawlCounts::from_records(pages),
            assets,
            verification: report.summary,
            output_dir: self.layout.root().to_string_lossy().replace('\\', "/"),
        }
    }

    fn write_summary(
        &self,
        summary: &RunSummary,
        pages: &[PageRecord],
        assets: &[AssetRecord],
        report: &MismatchReport,
    ) -> SnapshotResult<()> {
        write_json(&self.layout.manifest(names::SUMMARY_JSON), summary)?;
        write_markdown_report(
            &self.layout.manifest(names::SUMMARY_MD),
            summary,
            pages,
            assets,
            report,
        )?;
        tracing::info!(
            "Run finished in {:.2}s: {} captured, {} failed, {} mismatches",
            summary.duration_seconds,
            summary.crawl.success,
            summary.crawl.failed,
            summary.verification.mismatches
        );
        Ok(())
    }
}

/// Runs a complete snapshot with the configured browser CLI
///
/// The run directory is `output.dir` when set, otherwise a fresh timestamped
/// directory under `output.root`.
///
/// # Example
///
/// ```no_run
/// use site_snapshot::config::load_config;
/// use site_snapshot::crawler::run_snapshot;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("snapshot.toml"))?;
/// let summary = run_snapshot(config).await?;
/// println!("{} pages captured", summary.crawl.success);
/// # Ok(())
/// # }
/// ```
pub async fn run_snapshot(config: Config) -> SnapshotResult<RunSummary> {
    let layout = RunLayout::create(config.run_dir(Local::now()))?;
    let driver = AgentBrowser::from_config(&config.browser);
    let pipeline = Pipeline::new(config, driver, layout)?;
    pipeline.run().await
}

/// Re-runs verification over an existing run directory (`output.dir`)
pub async fn run_verify_only(config: Config) -> SnapshotResult<RunSummary> {
    let dir = config.output.dir.clone().ok_or_else(|| {
        ConfigError::Validation(
            "verify-only needs an existing run directory (output.dir or --output)".to_string(),
        )
    })?;
    let layout = RunLayout::open_existing(dir)?;
    let driver = AgentBrowser::from_config(&config.browser);
    let pipeline = Pipeline::new(config, driver, layout)?;
    pipeline.verify_only().await
}
