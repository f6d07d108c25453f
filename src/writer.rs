//! # Writer Module
//!
//! Persists rendered files without ever destroying existing work.
//!
//! With [`OverwritePolicy::Preserve`] an existing destination is left byte for
//! byte as it was and the new content lands next to it:
//!
//! ```text
//! src/dao/order_dao.rs                      (hand-edited, untouched)
//! src/dao/order_dao.rs.gen20240101T120000   (this run)
//! ```
//!
//! Every diverted file of one run carries the same timestamp, taken when the
//! [`OutputWriter`] is created. Two runs inside the same second divert to the
//! same sibling and the later one replaces it.
//!
//! A [`RunLock`] guards the output tree for the duration of a run so the
//! existence check and the write are not raced by a second invocation.

use crate::error::{Result, ScaffoldError};
use crate::replacer::RenderedTree;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Timestamp layout appended to diverted files
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Name of the advisory lock file created in the output root
pub const LOCK_FILE: &str = ".scaffold.lock";

/// What to do when the destination already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Keep the existing file and write to a timestamped sibling
    #[default]
    Preserve,
    /// Replace the existing file
    Overwrite,
}

impl OverwritePolicy {
    pub fn from_force(force: bool) -> Self {
        if force {
            OverwritePolicy::Overwrite
        } else {
            OverwritePolicy::Preserve
        }
    }
}

/// Where a write ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteOutcome {
    Created { path: PathBuf },
    Overwritten { path: PathBuf },
    Diverted { original: PathBuf, written: PathBuf },
}

impl WriteOutcome {
    /// The path that now holds the new content
    pub fn written(&self) -> &Path {
        match self {
            WriteOutcome::Created { path } | WriteOutcome::Overwritten { path } => path,
            WriteOutcome::Diverted { written, .. } => written,
        }
    }

    pub fn is_diverted(&self) -> bool {
        matches!(self, WriteOutcome::Diverted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    timestamp: String,
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputWriter {
    /// A writer stamped with the current local time
    pub fn new() -> Self {
        OutputWriter {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// A writer with a fixed stamp, e.g. `20240101T120000`
    pub fn with_timestamp(timestamp: impl Into<String>) -> Self {
        OutputWriter {
            timestamp: timestamp.into(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Sibling path used when `dest` already exists
    pub fn diverted_path(&self, dest: &Path) -> PathBuf {
        let mut name = dest.as_os_str().to_os_string();
        name.push(format!(".gen{}", self.timestamp));
        PathBuf::from(name)
    }

    /// Write `content` to `dest`, creating parent directories as needed
    pub fn write(
        &self,
        dest: &Path,
        content: &[u8],
        policy: OverwritePolicy,
    ) -> Result<WriteOutcome> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
        }

        let exists = dest.exists();
        let outcome = match (exists, policy) {
            (false, _) => {
                fs::write(dest, content).map_err(|e| ScaffoldError::io(dest, e))?;
                WriteOutcome::Created {
                    path: dest.to_path_buf(),
                }
            }
            (true, OverwritePolicy::Overwrite) => {
                fs::write(dest, content).map_err(|e| ScaffoldError::io(dest, e))?;
                WriteOutcome::Overwritten {
                    path: dest.to_path_buf(),
                }
            }
            (true, OverwritePolicy::Preserve) => {
                let written = self.diverted_path(dest);
                fs::write(&written, content).map_err(|e| ScaffoldError::io(&written, e))?;
                warn!(
                    existing = %dest.display(),
                    written = %written.display(),
                    "destination exists, wrote generated file alongside"
                );
                WriteOutcome::Diverted {
                    original: dest.to_path_buf(),
                    written,
                }
            }
        };
        debug!(path = %outcome.written().display(), "wrote file");
        Ok(outcome)
    }

    /// Write every file of a rendered tree under `root`
    ///
    /// Stops at the first I/O failure; files written before it stay.
    pub fn write_tree(
        &self,
        root: &Path,
        tree: &RenderedTree,
        policy: OverwritePolicy,
    ) -> Result<Vec<WriteOutcome>> {
        let mut outcomes = Vec::with_capacity(tree.files.len());
        for file in &tree.files {
            outcomes.push(self.write(&root.join(&file.rel_path), &file.content, policy)?);
        }
        info!(
            root = %root.display(),
            files = outcomes.len(),
            diverted = outcomes.iter().filter(|o| o.is_diverted()).count(),
            "wrote tree"
        );
        Ok(outcomes)
    }
}

/// Advisory single-writer lock on an output tree
///
/// Held for the lifetime of the value; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| ScaffoldError::io(dir, e))?;
        let path = dir.join(LOCK_FILE);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(lock = %path.display(), "acquired run lock");
                Ok(RunLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ScaffoldError::Locked { path }),
            Err(e) => Err(ScaffoldError::io(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacer::RenderedFile;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_divert() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::with_timestamp("20240101T120000");
        let dest = dir.path().join("src/dao/order_dao.rs");

        let first = writer.write(&dest, b"hand edited", OverwritePolicy::Preserve).unwrap();
        assert_eq!(first, WriteOutcome::Created { path: dest.clone() });

        let second = writer.write(&dest, b"generated", OverwritePolicy::Preserve).unwrap();
        let sibling = dir.path().join("src/dao/order_dao.rs.gen20240101T120000");
        assert_eq!(
            second,
            WriteOutcome::Diverted {
                original: dest.clone(),
                written: sibling.clone(),
            }
        );
        assert_eq!(fs::read(&dest).unwrap(), b"hand edited");
        assert_eq!(fs::read(&sibling).unwrap(), b"generated");
    }

    #[test]
    fn test_overwrite_policy() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new();
        let dest = dir.path().join("a.rs");
        fs::write(&dest, "old").unwrap();
        let outcome = writer.write(&dest, b"new", OverwritePolicy::Overwrite).unwrap();
        assert!(matches!(outcome, WriteOutcome::Overwritten { .. }));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_default_timestamp_shape() {
        let stamp = OutputWriter::new().timestamp().to_string();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'T');
    }

    #[test]
    fn test_write_tree_keeps_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "mine").unwrap();
        let tree = RenderedTree {
            files: vec![RenderedFile {
                rel_path: PathBuf::from("src/model/order.rs"),
                content: b"pub struct Order;\n".to_vec(),
            }],
            failures: vec![],
        };
        let outcomes = OutputWriter::new()
            .write_tree(dir.path(), &tree, OverwritePolicy::Preserve)
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("README.md")).unwrap(), "mine");
    }

    #[test]
    fn test_run_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let lock = RunLock::acquire(dir.path()).unwrap();
        let err = RunLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, ScaffoldError::Locked { .. }));
        drop(lock);
        assert!(!dir.path().join(LOCK_FILE).exists());
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
