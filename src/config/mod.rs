//! Configuration module for Site-Snapshot
//!
//! This module handles loading, parsing, and validating the TOML run
//! configuration, and reading the extraction scripts it points at.
//!
//! # Example
//!
//! ```no_run
//! use site_snapshot::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("snapshot.toml")).unwrap();
//! println!("Capture workers: {}", config.workers.capture);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetsConfig, BrowserConfig, Config, OutputConfig, Scripts, ScriptsConfig, SiteConfig,
    TimeoutsConfig, ViewportConfig, WorkersConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::{validate_worker_count, MAX_WORKERS};
