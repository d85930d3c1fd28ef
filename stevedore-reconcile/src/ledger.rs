//! Write ledger: the run-scoped record of created files and directories.

use std::path::{Path, PathBuf};

use stevedore_core::LedgerEntry;

/// Ordered, append-only list of filesystem objects created by one run.
///
/// Entries are appended only by a [`Session`](crate::Session) after a
/// successful creation of something that did not exist before. No
/// deduplication happens here; [`rollback`](crate::rollback) handles repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteLedger {
    entries: Vec<LedgerEntry>,
}

impl WriteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_file(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(LedgerEntry::File(path.into()));
    }

    pub(crate) fn record_dir(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(LedgerEntry::Dir(path.into()));
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|e| match e {
            LedgerEntry::File(p) => Some(p.as_path()),
            LedgerEntry::Dir(_) => None,
        })
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().filter_map(|e| match e {
            LedgerEntry::Dir(p) => Some(p.as_path()),
            LedgerEntry::File(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LedgerEntry> for WriteLedger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        WriteLedger {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_append_order_and_duplicates() {
        let mut ledger = WriteLedger::new();
        ledger.record_dir("k8s");
        ledger.record_file("k8s/service.yaml");
        ledger.record_dir("k8s");
        assert_eq!(ledger.len(), 3);
        assert_eq!(
            ledger.entries(),
            &[
                LedgerEntry::Dir("k8s".into()),
                LedgerEntry::File("k8s/service.yaml".into()),
                LedgerEntry::Dir("k8s".into()),
            ]
        );
    }

    #[test]
    fn files_and_dirs_are_split() {
        let ledger: WriteLedger = [
            LedgerEntry::File("a/b/f.txt".into()),
            LedgerEntry::Dir("a/b".into()),
            LedgerEntry::Dir("a".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(ledger.files().collect::<Vec<_>>(), vec![Path::new("a/b/f.txt")]);
        assert_eq!(
            ledger.dirs().collect::<Vec<_>>(),
            vec![Path::new("a/b"), Path::new("a")]
        );
    }
}
