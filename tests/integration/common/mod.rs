//! Shared fixtures for the integration tests
//!
//! `FakeDriver` stands in for the browser CLI. It answers `eval` by script:
//! the navigation script returns the canned link list, the page script the
//! canned extraction object of the opened URL, and the verify script the
//! canned live object of the opened URL.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use site_snapshot::browser::{BrowserDriver, BrowserSession, DriverError};
use site_snapshot::config::{parse_config, Config};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const NAV_JS: &str = "collectNavigation()";
pub const PAGE_JS: &str = "extractPage()";
pub const VERIFY_JS: &str = "verifyPage()";

#[derive(Debug, Default)]
pub struct FakeSite {
    pub nav: Vec<String>,
    pub pages: HashMap<String, Value>,
    pub live: HashMap<String, Value>,
    /// `<session> <command>` for every command run
    pub log: Mutex<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct FakeDriver {
    pub site: Arc<FakeSite>,
}

impl FakeDriver {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.site.log.lock().unwrap().clone()
    }

    /// Distinct session names, in first-use order
    pub fn sessions(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for line in self.log() {
            let name = line.split(' ').next().unwrap().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl BrowserDriver for FakeDriver {
    type Session = FakeSession;

    fn session(&self, name: &str) -> Result<FakeSession, DriverError> {
        Ok(FakeSession {
            name: name.to_string(),
            site: Arc::clone(&self.site),
            current: String::new(),
        })
    }
}

pub struct FakeSession {
    name: String,
    site: Arc<FakeSite>,
    current: String,
}

impl FakeSession {
    fn record(&self, command: &str) {
        self.site
            .log
            .lock()
            .unwrap()
            .push(format!("{} {}", self.name, command));
    }

    fn missing(&self, what: &str) -> DriverError {
        DriverError::Failed {
            command: "eval".to_string(),
            code: "1".to_string(),
            stderr: format!("no {} for {}", what, self.current),
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        self.record(&format!("set viewport {} {}", width, height));
        Ok(())
    }

    async fn open(&mut self, url: &str) -> Result<(), DriverError> {
        self.record(&format!("open {}", url));
        self.current = url.to_string();
        Ok(())
    }

    async fn wait(&mut self, millis: u64) -> Result<(), DriverError> {
        self.record(&format!("wait {}", millis));
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        self.record("screenshot --full");
        std::fs::write(path, b"\x89PNG\r\n").map_err(|e| DriverError::Failed {
            command: "screenshot".to_string(),
            code: "1".to_string(),
            stderr: e.to_string(),
        })
    }

    async fn html(&mut self) -> Result<String, DriverError> {
        self.record("get html html");
        Ok(format!("<html><body>{}</body></html>", self.current))
    }

    async fn eval(&mut self, script: &str) -> Result<String, DriverError> {
        self.record("eval");
        let value = match script {
            NAV_JS => Some(Value::from(self.site.nav.clone())),
            PAGE_JS => self.site.pages.get(&self.current).cloned(),
            VERIFY_JS => self.site.live.get(&self.current).cloned(),
            _ => None,
        };
        // Drivers print JSON; some print it as an encoded string
        value
            .map(|v| v.to_string())
            .ok_or_else(|| self.missing("canned output"))
    }
}

/// Writes the extraction scripts into `dir` and parses a config around them
pub fn test_config(dir: &Path, sitemap_url: &str, workers: usize) -> Config {
    std::fs::write(dir.join("nav.js"), NAV_JS).unwrap();
    std::fs::write(dir.join("page.js"), PAGE_JS).unwrap();
    std::fs::write(dir.join("verify.js"), VERIFY_JS).unwrap();

    let toml = format!(
        r#"
[site]
url = "https://www.site.test/"
hosts = ["www.site.test", "site.test"]
sitemap-url = "{sitemap}"

[workers]
capture = {workers}
assets = {workers}

[browser]
settle-ms = 10

[scripts]
nav = "{dir}/nav.js"
page = "{dir}/page.js"
verify = "{dir}/verify.js"

[assets]
timeout-secs = 10
"#,
        sitemap = sitemap_url,
        workers = workers,
        dir = dir.display()
    );
    parse_config(&toml).unwrap()
}
