//! Browser driver interface
//!
//! The capture and verification phases drive a real browser through a narrow
//! command interface: one named session per worker, addressed by name, with
//! the driver responsible for keeping the browser alive between commands.
//!
//! - [`BrowserDriver`] hands out sessions by name
//! - [`BrowserSession`] runs the individual commands
//! - [`AgentBrowser`] realizes both over a session-scoped command line tool

mod agent;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{AgentBrowser, AgentSession, CommandTimeouts};

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single driver command
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {limit:?}")]
    Timeout { command: String, limit: Duration },

    #[error("`{command}` failed ({code}): {stderr}")]
    Failed {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("session {0:?} unavailable: {1}")]
    Session(String, String),
}

/// Source of named browser sessions
pub trait BrowserDriver: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    /// Returns a handle to the session called `name`
    fn session(&self, name: &str) -> Result<Self::Session, DriverError>;
}

/// One browser session, owned by exactly one worker
#[async_trait]
pub trait BrowserSession: Send {
    fn name(&self) -> &str;

    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), DriverError>;

    async fn open(&mut self, url: &str) -> Result<(), DriverError>;

    async fn wait(&mut self, millis: u64) -> Result<(), DriverError>;

    /// Full-page screenshot written to `path`
    async fn screenshot(&mut self, path: &Path) -> Result<(), DriverError>;

    /// Serialized document HTML
    async fn html(&mut self) -> Result<String, DriverError>;

    /// Evaluates `script` in the page and returns its raw textual result
    async fn eval(&mut self, script: &str) -> Result<String, DriverError>;
}

/// Decodes the textual result of an `eval`
///
/// Drivers print the script's return value as JSON; some print an
/// already-serialized string a second time, so a JSON string holding JSON is
/// decoded once more.
pub fn decode_eval_output(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw.trim())?;
    match value {
        serde_json::Value::String(inner) => match serde_json::from_str(&inner) {
            Ok(decoded) => Ok(decoded),
            Err(_) => Ok(serde_json::Value::String(inner)),
        },
        other => Ok(other),
    }
}
