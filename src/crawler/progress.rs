//! Shared progress sink
//!
//! Workers report every finished item here. Each line goes to the tracing
//! log and is appended to `logs/progress.log`; the mutex is held only while
//! a single line is written, so lines from different workers never
//! interleave.

use crate::{SnapshotError, SnapshotResult};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One progress report
#[derive(Debug, Clone, Copy)]
pub struct ProgressLine<'a> {
    /// Phase tag: `capture`, `assets` or `verify`
    pub phase: &'a str,
    pub worker: usize,
    /// Counted unit: `page` or `asset`
    pub unit: &'a str,
    /// 1-based position within the worker's chunk
    pub index: usize,
    pub total: usize,
    pub status: &'a str,
    pub url: &'a str,
}

impl fmt::Display for ProgressLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] worker={} {}={}/{} status={} url={}",
            self.phase, self.worker, self.unit, self.index, self.total, self.status, self.url
        )
    }
}

/// Cloneable handle to the run's progress log
#[derive(Debug, Clone)]
pub struct ProgressSink {
    file: Arc<Mutex<Option<File>>>,
}

impl ProgressSink {
    /// Opens (or creates) the progress log in append mode
    pub fn open(path: &Path) -> SnapshotResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SnapshotError::Setup {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    /// A sink that only logs
    pub fn disabled() -> Self {
        Self {
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// Records one finished item
    pub fn record(&self, line: ProgressLine<'_>) {
        // A worker that panicked mid-write leaves the lock poisoned; the file
        // itself is still usable.
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if line.status == "success" {
            tracing::info!("{}", line);
        } else {
            tracing::warn!("{}", line);
        }

        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", line) {
                tracing::warn!("Failed to append to progress log: {}", e);
            }
        }
    }

    /// Appends a free-form phase marker such as `[crawl] success=3 failed=1`
    pub fn note(&self, message: &str) {
        let mut guard = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::info!("{}", message);
        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", message) {
                tracing::warn!("Failed to append to progress log: {}", e);
            }
        }
    }
}
