//! Run directory layout
//!
//! Every artifact of a run lives under one root directory:
//!
//! ```text
//! <root>/
//!   manifests/            inventory lists, ledgers, reports, summary
//!   logs/progress.log     one line per processed item
//!   raw_html/<pageId>.html
//!   page_json/<pageId>.json
//!   screenshots/desktop/<pageId>.png
//!   screenshots/mobile/<pageId>.png
//!   assets/downloads/<host>/<path...>
//! ```

use crate::{SnapshotError, SnapshotResult};
use std::path::{Component, Path, PathBuf};

/// Directories created before any phase runs
const RUN_DIRS: &[&str] = &[
    "manifests",
    "logs",
    "raw_html",
    "page_json",
    "screenshots/desktop",
    "screenshots/mobile",
    "assets/downloads",
];

/// Paths of one run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    /// Creates the run directory and all of its subdirectories
    ///
    /// Failure here aborts the run before any work starts.
    pub fn create(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let layout = Self { root: root.into() };
        for dir in RUN_DIRS {
            let path = layout.root.join(dir);
            std::fs::create_dir_all(&path)
                .map_err(|source| SnapshotError::Setup { path, source })?;
        }
        Ok(layout)
    }

    /// Opens an existing run directory, as written by a previous run
    pub fn open_existing(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let layout = Self { root: root.into() };
        let manifests = layout.manifests_dir();
        if !manifests.is_dir() {
            return Err(SnapshotError::Setup {
                path: manifests,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a run directory (no manifests/)",
                ),
            });
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifests_dir(&self) -> PathBuf {
        self.root.join("manifests")
    }

    /// Path of a file under `manifests/`
    pub fn manifest(&self, name: &str) -> PathBuf {
        self.manifests_dir().join(name)
    }

    pub fn progress_log(&self) -> PathBuf {
        self.root.join("logs").join("progress.log")
    }

    pub fn raw_html(&self, page_id: &str) -> PathBuf {
        self.root.join("raw_html").join(format!("{}.html", page_id))
    }

    pub fn page_json(&self, page_id: &str) -> PathBuf {
        self.root.join("page_json").join(format!("{}.json", page_id))
    }

    pub fn desktop_screenshot(&self, page_id: &str) -> PathBuf {
        self.root
            .join("screenshots")
            .join("desktop")
            .join(format!("{}.png", page_id))
    }

    pub fn mobile_screenshot(&self, page_id: &str) -> PathBuf {
        self.root
            .join("screenshots")
            .join("mobile")
            .join(format!("{}.png", page_id))
    }

    /// Root of the mirrored asset tree
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("assets").join("downloads")
    }

    /// Path of `path` relative to the run root, with forward slashes
    ///
    /// Paths outside the root are returned whole.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::RootDir => Some(String::new()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resolves a ledger path (relative to the root, or absolute)
    pub fn resolve(&self, recorded: &str) -> PathBuf {
        let path = Path::new(recorded);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_all_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::create(dir.path().join("run")).unwrap();
        for sub in RUN_DIRS {
            assert!(layout.root().join(sub).is_dir(), "{}", sub);
        }
        assert!(RunLayout::open_existing(layout.root()).is_ok());
    }

    #[test]
    fn test_open_existing_requires_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let result = RunLayout::open_existing(dir.path());
        assert!(matches!(result, Err(SnapshotError::Setup { .. })));
    }

    #[test]
    fn test_create_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let result = RunLayout::create(blocker.join("run"));
        assert!(matches!(result, Err(SnapshotError::Setup { .. })));
    }

    #[test]
    fn test_relative_paths_use_forward_slashes() {
        let layout = RunLayout {
            root: PathBuf::from("/runs/example"),
        };
        assert_eq!(
            layout.relative(&layout.desktop_screenshot("home-0123456789")),
            "screenshots/desktop/home-0123456789.png"
        );
        assert_eq!(layout.relative(&layout.page_json("a")), "page_json/a.json");
        assert_eq!(
            layout.resolve("page_json/a.json"),
            PathBuf::from("/runs/example/page_json/a.json")
        );
        assert_eq!(layout.resolve("/abs/x.json"), PathBuf::from("/abs/x.json"));
    }
}
