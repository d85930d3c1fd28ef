//! Rollback: undo what a failed run created, and nothing else.
//!
//! Files go first, then directories deepest-first. A directory is removed only
//! if it is empty at that moment; removal then walks up through parents that
//! the same ledger recorded and stops at the first one that is not empty.
//! Directories that existed before the run are never in the ledger and are
//! never touched, even when they are empty.
//!
//! Rollback never fails: every problem is logged and collected in the
//! [`RollbackReport`] so the original error stays the one the user sees.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ledger::WriteLedger;

/// A ledger entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure {
    pub path: PathBuf,
    pub message: String,
}

/// What rollback removed, what it had to leave behind, and what failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub removed_files: Vec<PathBuf>,
    pub removed_dirs: Vec<PathBuf>,
    /// Ledgered directories left in place because they still hold content.
    pub kept_dirs: Vec<PathBuf>,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.kept_dirs.is_empty() && self.failures.is_empty()
    }
}

enum DirOutcome {
    Removed,
    Missing,
    NotEmpty,
}

/// Undo every entry of `ledger`, resolving paths against `root`.
pub fn rollback(root: &Path, ledger: WriteLedger) -> RollbackReport {
    let mut report = RollbackReport::default();

    for file in ledger.files() {
        match fs::remove_file(root.join(file)) {
            Ok(()) => {
                tracing::info!("rolled back: {}", file.display());
                report.removed_files.push(file.to_path_buf());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("already gone: {}", file.display());
            }
            Err(e) => {
                tracing::warn!("could not remove {}: {e}", file.display());
                report.failures.push(RollbackFailure {
                    path: file.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    let ledgered: HashSet<&Path> = ledger.dirs().collect();
    let mut dirs: Vec<&Path> = ledgered.iter().copied().collect();
    dirs.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

    let mut removed: HashSet<PathBuf> = HashSet::new();
    let mut kept: BTreeSet<PathBuf> = BTreeSet::new();

    for dir in dirs {
        let mut current = Some(dir);
        while let Some(path) = current {
            if removed.contains(path) {
                break;
            }
            match remove_if_empty(&root.join(path)) {
                Ok(DirOutcome::Removed) => {
                    tracing::info!("rolled back dir: {}", path.display());
                    kept.remove(path);
                    removed.insert(path.to_path_buf());
                    report.removed_dirs.push(path.to_path_buf());
                }
                Ok(DirOutcome::Missing) => {
                    removed.insert(path.to_path_buf());
                }
                Ok(DirOutcome::NotEmpty) => {
                    tracing::debug!("not empty, keeping: {}", path.display());
                    kept.insert(path.to_path_buf());
                    break;
                }
                Err(e) => {
                    tracing::warn!("could not remove {}: {e}", path.display());
                    report.failures.push(RollbackFailure {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
            current = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty() && ledgered.contains(parent));
        }
    }

    report.kept_dirs = kept.into_iter().collect();
    report
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

fn remove_if_empty(dir: &Path) -> io::Result<DirOutcome> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DirOutcome::Missing),
        Err(e) => return Err(e),
    };
    if entries.next().is_some() {
        return Ok(DirOutcome::NotEmpty);
    }
    match fs::remove_dir(dir) {
        Ok(()) => Ok(DirOutcome::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DirOutcome::Missing),
        Err(e) => Err(e),
    }
}
