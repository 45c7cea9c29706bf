//! Site-Snapshot main entry point
//!
//! This is the command-line interface for the Site-Snapshot capture tool.

use chrono::Local;
use clap::Parser;
use site_snapshot::classify::ResourceClassifier;
use site_snapshot::config::{load_config_with_hash, validate_worker_count, Config};
use site_snapshot::crawler::{run_snapshot, run_verify_only};
use site_snapshot::output::print_summary;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Snapshot: capture, mirror and re-verify a website
///
/// Site-Snapshot resolves a site's pages from its sitemap and navigation,
/// captures each page through a browser driver, mirrors the static assets
/// the pages reference, and re-checks the live site for drift.
#[derive(Parser, Debug)]
#[command(name = "site-snapshot")]
#[command(version = "1.0.0")]
#[command(about = "Capture, mirror and re-verify a website", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run directory (overrides output.dir)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Browser sessions for capture and verification (overrides workers.capture)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Concurrent asset downloads (overrides workers.assets)
    #[arg(long, value_name = "N")]
    asset_workers: Option<usize>,

    /// Validate config and show the run plan without capturing anything
    #[arg(long, conflicts_with = "verify_only")]
    dry_run: bool,

    /// Re-run verification against an existing run directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    verify_only: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.verify_only {
        handle_verify_only(config).await?;
    } else {
        handle_snapshot(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_snapshot=info,warn"),
            1 => EnvFilter::new("site_snapshot=debug,info"),
            2 => EnvFilter::new("site_snapshot=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.output {
        config.output.dir = Some(dir.clone());
    }
    if let Some(workers) = cli.workers {
        validate_worker_count("--workers", workers)?;
        config.workers.capture = workers;
    }
    if let Some(workers) = cli.asset_workers {
        validate_worker_count("--asset-workers", workers)?;
        config.workers.assets = workers;
    }
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows the run plan
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Site-Snapshot Dry Run ===\n");

    println!("Site:");
    println!("  URL: {}", config.site.url);
    println!("  Sitemap: {}", config.sitemap_url()?);
    println!("  Crawl scheme: {}", config.site.crawl_scheme);
    println!("  Hosts ({}):", config.site.hosts.len());
    for host in &config.site.hosts {
        println!("    - {}", host);
    }

    println!("\nWorkers:");
    println!("  Capture/verify sessions: {}", config.workers.capture);
    println!("  Asset downloads: {}", config.workers.assets);

    println!("\nBrowser:");
    println!("  Command: {}", config.browser.command);
    if let Some(home) = &config.browser.home_dir {
        println!("  HOME: {}", home.display());
    }
    println!("  Settle delay: {}ms", config.browser.settle_ms);
    println!(
        "  Desktop viewport: {}x{}",
        config.browser.desktop_viewport.width, config.browser.desktop_viewport.height
    );
    println!(
        "  Mobile viewport: {}x{}",
        config.browser.mobile_viewport.width, config.browser.mobile_viewport.height
    );

    println!("\nScripts:");
    println!("  Navigation: {}", config.scripts.nav.display());
    println!("  Page: {}", config.scripts.page.display());
    println!("  Verify: {}", config.scripts.verify.display());

    println!("\nOutput:");
    println!("  Run directory: {}", config.run_dir(Local::now()).display());

    let classifier = ResourceClassifier::new(config.site_hosts()?).with_extra_hosts(
        config.assets.extra_runtime_blocklist.iter(),
        config.assets.extra_static_allowlist.iter(),
    );
    let rules = classifier.describe_rules(&BTreeMap::new());

    println!("\nAsset Rules (first match wins):");
    for (index, rule) in rules.rules.iter().enumerate() {
        println!(
            "  {}. {:<7} {:<36} {}",
            index + 1,
            rule.result,
            rule.reason.as_str(),
            rule.description
        );
    }
    println!(
        "\nRuntime host blocklist ({}):",
        rules.runtime_host_blocklist.len()
    );
    for host in &rules.runtime_host_blocklist {
        println!("  - {}", host);
    }
    println!(
        "\nStatic host allowlist ({}):",
        rules.static_host_allowlist.len()
    );
    for host in &rules.static_host_allowlist {
        println!("  - {}", host);
    }

    config.scripts.load()?;

    println!("\n✓ Configuration is valid");
    println!("✓ Extraction scripts are readable");

    Ok(())
}

/// Handles the --verify-only mode: re-checks an existing run
async fn handle_verify_only(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match run_verify_only(config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Verification failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main snapshot run
async fn handle_snapshot(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Capture workers: {}, asset workers: {}",
        config.workers.capture,
        config.workers.assets
    );

    match run_snapshot(config).await {
        Ok(summary) => {
            tracing::info!("Snapshot completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Snapshot failed: {}", e);
            Err(e.into())
        }
    }
}
