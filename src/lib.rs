//! Site-Snapshot: capture, mirror and re-verify a bounded website
//!
//! This crate resolves a site's page inventory, captures every page through a
//! browser driver (HTML, structured extraction JSON, desktop and mobile
//! screenshots), mirrors the static assets those pages reference, and finally
//! re-visits the live site to report drift against the stored capture.

pub mod assets;
pub mod browser;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod inventory;
pub mod output;
pub mod state;
pub mod url;
pub mod verify;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for run-level failures
///
/// Anything surfacing as a `SnapshotError` aborts the run. Per-page and
/// per-asset failures are carried as [`ItemError`] and recorded in the ledgers.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to prepare {path}: {source}")]
    Setup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Sitemap {url} returned HTTP {status}")]
    SitemapStatus { url: String, status: u16 },

    #[error("Sitemap parse error: {0}")]
    SitemapParse(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Malformed manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to read script {path}: {source}")]
    Script {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// URL-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Empty URL")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Invalid host: {0}")]
    InvalidHost(String),
}

/// Failure of a single page, asset or verification item
///
/// These never abort a phase; the worker converts them into an `error` record
/// and moves on to its next item.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Driver(#[from] browser::DriverError),

    #[error("network failure: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("malformed extraction output: {0}")]
    DataShape(String),

    #[error("failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for run-level operations
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

/// Result type alias for per-item operations
pub type ItemResult<T> = std::result::Result<T, ItemError>;

// Re-export commonly used types
pub use classify::{ClassificationDecision, Reason, ResourceClassifier};
pub use config::Config;
pub use crawler::{run_snapshot, run_verify_only, Pipeline};
pub use state::CaptureState;
pub use url::{canonicalize, canonicalize_crawl_url, canonicalize_resource_url, CanonicalUrl};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_level_conversions() {
        let config: SnapshotError = ConfigError::Validation("workers must be >= 1".to_string()).into();
        assert!(matches!(config, SnapshotError::Config(ConfigError::Validation(_))));
        assert_eq!(
            config.to_string(),
            "Configuration error: Validation error: workers must be >= 1"
        );

        let json: SnapshotError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(json, SnapshotError::Json(_)));
    }

    #[test]
    fn test_driver_errors_stay_per_item() {
        let item: ItemError = browser::DriverError::Session("capture-1".to_string(), "gone".to_string()).into();
        assert!(matches!(item, ItemError::Driver(_)));
        assert_eq!(item.to_string(), r#"session "capture-1" unavailable: gone"#);
    }
}
