use crate::url::SiteHosts;
use crate::ConfigError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Site-Snapshot
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    pub browser: BrowserConfig,
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The site being captured
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Home page of the site; also where navigation links are read from
    pub url: String,

    /// First-party host patterns (`example.com` or `*.example.com`)
    pub hosts: Vec<String>,

    /// Sitemap location, defaults to `<site origin>/sitemap.xml`
    #[serde(default)]
    pub sitemap_url: Option<String>,

    /// Scheme every crawl URL is forced to
    #[serde(default = "default_crawl_scheme")]
    pub crawl_scheme: String,
}

/// Worker pool sizes per phase
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkersConfig {
    /// Browser sessions used for capture and verification
    #[serde(default = "default_capture_workers")]
    pub capture: usize,

    /// Concurrent asset downloaders
    #[serde(default = "default_asset_workers")]
    pub assets: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            capture: default_capture_workers(),
            assets: default_asset_workers(),
        }
    }
}

/// Browser driver configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Driver executable, invoked as `<command> --session <name> ...`
    #[serde(default = "default_browser_command")]
    pub command: String,

    /// `HOME` for the driver process, if it must differ from ours
    #[serde(default)]
    pub home_dir: Option<PathBuf>,

    /// Delay after navigation before anything is read (milliseconds)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_desktop_viewport")]
    pub desktop_viewport: ViewportConfig,

    #[serde(default = "default_mobile_viewport")]
    pub mobile_viewport: ViewportConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

/// Per-command driver timeouts (seconds)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeoutsConfig {
    #[serde(default = "default_viewport_timeout")]
    pub viewport: u64,
    #[serde(default = "default_open_timeout")]
    pub open: u64,
    #[serde(default = "default_wait_timeout")]
    pub wait: u64,
    #[serde(default = "default_screenshot_timeout")]
    pub screenshot: u64,
    #[serde(default = "default_html_timeout")]
    pub html: u64,
    #[serde(default = "default_eval_timeout")]
    pub eval: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            viewport: default_viewport_timeout(),
            open: default_open_timeout(),
            wait: default_wait_timeout(),
            screenshot: default_screenshot_timeout(),
            html: default_html_timeout(),
            eval: default_eval_timeout(),
        }
    }
}

/// Paths of the in-page extraction scripts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptsConfig {
    /// Returns a JSON array of navigation link URLs
    pub nav: PathBuf,

    /// Returns the structured page extraction object
    pub page: PathBuf,

    /// Returns the light verification object
    pub verify: PathBuf,
}

/// Asset mirroring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetsConfig {
    /// User agent for sitemap and asset requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(default = "default_asset_timeout")]
    pub timeout_secs: u64,

    /// Hosts added to the runtime blocklist
    #[serde(default)]
    pub extra_runtime_blocklist: Vec<String>,

    /// Hosts added to the static allowlist
    #[serde(default)]
    pub extra_static_allowlist: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_asset_timeout(),
            extra_runtime_blocklist: Vec::new(),
            extra_static_allowlist: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Parent directory of timestamped run directories
    #[serde(default = "default_output_root")]
    pub root: PathBuf,

    /// Fixed run directory, overriding the timestamped default
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            dir: None,
        }
    }
}

fn default_crawl_scheme() -> String {
    "https".to_string()
}

fn default_capture_workers() -> usize {
    4
}

fn default_asset_workers() -> usize {
    8
}

fn default_browser_command() -> String {
    "agent-browser".to_string()
}

fn default_settle_ms() -> u64 {
    1200
}

fn default_desktop_viewport() -> ViewportConfig {
    ViewportConfig {
        width: 1440,
        height: 900,
    }
}

fn default_mobile_viewport() -> ViewportConfig {
    ViewportConfig {
        width: 390,
        height: 844,
    }
}

fn default_viewport_timeout() -> u64 {
    45
}

fn default_open_timeout() -> u64 {
    150
}

fn default_wait_timeout() -> u64 {
    45
}

fn default_screenshot_timeout() -> u64 {
    180
}

fn default_html_timeout() -> u64 {
    150
}

fn default_eval_timeout() -> u64 {
    180
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
        .to_string()
}

fn default_asset_timeout() -> u64 {
    45
}

fn default_output_root() -> PathBuf {
    PathBuf::from("capture")
}

impl Config {
    /// Sitemap location, falling back to `<site origin>/sitemap.xml`
    pub fn sitemap_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.site.sitemap_url {
            return Ok(url.clone());
        }
        let site = Url::parse(&self.site.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid site.url: {}", e)))?;
        let sitemap = site
            .join("/sitemap.xml")
            .map_err(|e| ConfigError::InvalidUrl(format!("Cannot derive sitemap URL: {}", e)))?;
        Ok(sitemap.to_string())
    }

    /// First-party host set used for nav filtering and classification
    pub fn site_hosts(&self) -> Result<SiteHosts, ConfigError> {
        SiteHosts::new(&self.site.hosts)
    }

    /// Run directory: `output.dir` if set, else `<root>/<site-host>-<timestamp>`
    pub fn run_dir(&self, started: DateTime<Local>) -> PathBuf {
        if let Some(dir) = &self.output.dir {
            return dir.clone();
        }
        let host = Url::parse(&self.site.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "site".to_string());
        self.output
            .root
            .join(format!("{}-{}", host, started.format("%Y%m%d-%H%M%S")))
    }
}

impl ScriptsConfig {
    /// Reads all three extraction scripts
    pub fn load(&self) -> Result<Scripts, ConfigError> {
        Ok(Scripts {
            nav: read_script(&self.nav)?,
            page: read_script(&self.page)?,
            verify: read_script(&self.verify)?,
        })
    }
}

/// Extraction script sources, as evaluated in the page
#[derive(Debug, Clone, Default)]
pub struct Scripts {
    pub nav: String,
    pub page: String,
    pub verify: String,
}

fn read_script(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Script {
        path: path.to_path_buf(),
        source,
    })
}
