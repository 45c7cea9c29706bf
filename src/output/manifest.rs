//! Manifest readers and writers
//!
//! JSON manifests are pretty-printed with two-space indentation and a
//! trailing newline; list manifests hold one entry per line.

use crate::{SnapshotError, SnapshotResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Writes `value` as pretty JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> SnapshotResult<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    write_text(path, &text)
}

/// Writes one item per line, newline-terminated
pub fn write_lines<I, S>(path: &Path, lines: I) -> SnapshotResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    write_text(path, &text)
}

/// Writes text, creating parent directories
pub fn write_text(path: &Path, text: &str) -> SnapshotResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON manifest written by [`write_json`]
pub fn read_json<T: DeserializeOwned>(path: &Path) -> SnapshotResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SnapshotError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}
