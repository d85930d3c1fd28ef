//! Directory provisioning, one path segment at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ReconcileError};

/// Create every missing segment of `rel` under `root`.
///
/// Segments actually created are pushed onto `created` (shallowest first) as
/// soon as they exist, so the caller still knows about them when a later
/// segment fails.
pub(crate) fn create_segments(
    root: &Path,
    rel: &Path,
    created: &mut Vec<PathBuf>,
) -> Result<(), ReconcileError> {
    let mut current = PathBuf::new();
    for component in rel.components() {
        current.push(component.as_os_str());
        let abs = root.join(&current);
        match fs::metadata(&abs) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => {
                return Err(io_err(
                    &current,
                    io::Error::new(io::ErrorKind::AlreadyExists, "exists and is not a directory"),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(&current, e)),
        }
        match fs::create_dir(&abs) {
            Ok(()) => {
                tracing::debug!("created dir: {}", current.display());
                created.push(current.clone());
            }
            // Someone else got there first; it is not ours to roll back.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && abs.is_dir() => {}
            Err(e) => return Err(io_err(&current, e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_only_missing_segments() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        let mut created = Vec::new();
        create_segments(tmp.path(), Path::new("a/b/c"), &mut created).unwrap();
        assert_eq!(created, vec![PathBuf::from("a/b"), PathBuf::from("a/b/c")]);
        assert!(tmp.path().join("a/b/c").is_dir());
    }

    #[test]
    fn file_in_the_way_is_reported_with_its_path() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("a/b"), "file").unwrap();
        let mut created = Vec::new();
        let err = create_segments(tmp.path(), Path::new("a/b/c"), &mut created).unwrap_err();
        match err {
            ReconcileError::Io { path, .. } => assert_eq!(path, PathBuf::from("a/b")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(created.is_empty());
    }

    #[test]
    fn existing_path_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("k8s")).unwrap();
        let mut created = Vec::new();
        create_segments(tmp.path(), Path::new("k8s"), &mut created).unwrap();
        assert!(created.is_empty());
    }
}
