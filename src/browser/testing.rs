//! Scripted in-memory driver for unit tests

use crate::browser::{BrowserDriver, BrowserSession, DriverError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Canned behaviour shared by every session of a [`ScriptedDriver`]
#[derive(Debug, Default)]
pub struct ScriptedSite {
    /// Eval output per opened URL
    pub evals: HashMap<String, String>,
    /// Eval output when the opened URL has no entry
    pub default_eval: Option<String>,
    /// URLs whose `open` fails
    pub broken_urls: HashSet<String>,
    /// Session names that cannot be created
    pub broken_sessions: HashSet<String>,
    /// Every command run, as `<session> <command>`
    pub log: Mutex<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDriver {
    pub site: Arc<ScriptedSite>,
}

impl ScriptedDriver {
    pub fn new(site: ScriptedSite) -> Self {
        Self {
            site: Arc::new(site),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.site.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl BrowserDriver for ScriptedDriver {
    type Session = ScriptedSession;

    fn session(&self, name: &str) -> Result<ScriptedSession, DriverError> {
        if self.site.broken_sessions.contains(name) {
            return Err(DriverError::Session(name.to_string(), "refused".to_string()));
        }
        Ok(ScriptedSession {
            name: name.to_string(),
            site: Arc::clone(&self.site),
            current: None,
            opened: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct ScriptedSession {
    name: String,
    site: Arc<ScriptedSite>,
    current: Option<String>,
    opened: Vec<String>,
}

impl ScriptedSession {
    /// Standalone session with no canned output
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            site: Arc::new(ScriptedSite::default()),
            current: None,
            opened: Vec::new(),
        }
    }

    /// Makes every eval return `raw`
    pub fn with_eval(self, raw: &str) -> Self {
        let site = ScriptedSite {
            default_eval: Some(raw.to_string()),
            ..ScriptedSite::default()
        };
        Self {
            site: Arc::new(site),
            ..self
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.clone()
    }

    fn record(&self, command: String) {
        if let Ok(mut log) = self.site.log.lock() {
            log.push(format!("{} {}", self.name, command));
        }
    }

    fn failed(&self, command: &str, stderr: &str) -> DriverError {
        DriverError::Failed {
            command: command.to_string(),
            code: "1".to_string(),
            stderr: stderr.to_string(),
        }
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError> {
        self.record(format!("set viewport {} {}", width, height));
        Ok(())
    }

    async fn open(&mut self, url: &str) -> Result<(), DriverError> {
        self.record(format!("open {}", url));
        if self.site.broken_urls.contains(url) {
            return Err(self.failed("open", "net::ERR_CONNECTION_RESET"));
        }
        self.current = Some(url.to_string());
        self.opened.push(url.to_string());
        Ok(())
    }

    async fn wait(&mut self, millis: u64) -> Result<(), DriverError> {
        self.record(format!("wait {}", millis));
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        self.record(format!("screenshot --full {}", path.display()));
        std::fs::write(path, b"\x89PNG").map_err(|e| self.failed("screenshot", &e.to_string()))
    }

    async fn html(&mut self) -> Result<String, DriverError> {
        self.record("get html html".to_string());
        let url = self.current.clone().unwrap_or_default();
        Ok(format!("<html><body>{}</body></html>", url))
    }

    async fn eval(&mut self, _script: &str) -> Result<String, DriverError> {
        self.record("eval".to_string());
        let current = self.current.clone().unwrap_or_default();
        self.site
            .evals
            .get(&current)
            .or(self.site.default_eval.as_ref())
            .cloned()
            .ok_or_else(|| self.failed("eval", "no page loaded"))
    }
}
