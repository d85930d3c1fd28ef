//! Run orchestration: provision, reconcile every artifact, roll back on
//! failure.
//!
//! ## Protocol
//!
//! 1. Resolve every artifact (merge overlays). A bad artifact aborts before
//!    anything on disk changes.
//! 2. Ensure each config directory of the target exists.
//! 3. Reconcile each artifact in order.
//! 4. On the first error, roll back the session's ledger and return the error
//!    together with the [`RollbackReport`].

use std::path::{Path, PathBuf};

use thiserror::Error;

use stevedore_core::Artifact;

use crate::error::ReconcileError;
use crate::ledger::WriteLedger;
use crate::reconciler::{ReconcileReport, Session};
use crate::rollback::{rollback, RollbackReport};

/// Result of a run that completed.
#[derive(Debug)]
pub struct Applied {
    pub reports: Vec<ReconcileReport>,
    /// What the run created. Callers that fail later (e.g. a deploy tool)
    /// can still hand this to [`rollback`].
    pub ledger: WriteLedger,
}

/// A run that failed and was rolled back.
#[derive(Debug, Error)]
#[error("run aborted")]
pub struct Aborted {
    #[source]
    pub source: ReconcileError,
    pub rollback: RollbackReport,
}

/// Provision `config_dirs` and reconcile `artifacts` within `session`.
pub fn run(
    mut session: Session<'_>,
    config_dirs: &[&str],
    artifacts: &[Artifact],
) -> Result<Applied, Aborted> {
    let resolved = match resolve_all(artifacts) {
        Ok(resolved) => resolved,
        Err(source) => {
            return Err(Aborted {
                source,
                rollback: RollbackReport::default(),
            })
        }
    };

    match apply(&mut session, config_dirs, &resolved) {
        Ok(reports) => Ok(Applied {
            reports,
            ledger: session.into_ledger(),
        }),
        Err(source) => {
            tracing::error!("{source}; rolling back");
            let root = session.root().to_path_buf();
            let report = rollback(&root, session.into_ledger());
            Err(Aborted {
                source,
                rollback: report,
            })
        }
    }
}

fn resolve_all(artifacts: &[Artifact]) -> Result<Vec<(PathBuf, String)>, ReconcileError> {
    artifacts
        .iter()
        .map(|a| Ok((a.path.clone(), a.resolve()?)))
        .collect()
}

fn apply(
    session: &mut Session<'_>,
    config_dirs: &[&str],
    resolved: &[(PathBuf, String)],
) -> Result<Vec<ReconcileReport>, ReconcileError> {
    for dir in config_dirs {
        session.ensure_dir(Path::new(dir))?;
    }
    resolved
        .iter()
        .map(|(path, content)| session.reconcile(path, content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::NoPrompt;
    use std::fs;
    use stevedore_core::Policy;
    use tempfile::TempDir;

    #[test]
    fn failure_rolls_back_created_files_and_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Dockerfile"), "user owned").unwrap();
        // A directory where the last artifact should be makes its write fail.
        fs::create_dir(tmp.path().join("skaffold.yaml")).unwrap();

        let artifacts = vec![
            Artifact::literal("Dockerfile", "FROM node\n"),
            Artifact::literal("k8s/deployment.yaml", "kind: Deployment\n"),
            Artifact::literal("skaffold.yaml", "apiVersion: x\n"),
        ];

        let mut prompt = NoPrompt;
        let mut out = Vec::new();
        let mut console = Vec::new();
        let session = Session::new(tmp.path(), Policy::force(), &mut prompt, &mut out, &mut console);
        let aborted = run(session, &["k8s"], &artifacts).unwrap_err();

        assert!(matches!(aborted.source, ReconcileError::Io { ref path, .. } if path == Path::new("skaffold.yaml")));
        assert!(!tmp.path().join("k8s").exists());
        // Pre-existing file was overwritten under force but is not removed.
        assert!(tmp.path().join("Dockerfile").exists());
        assert!(aborted.rollback.is_clean());
    }

    #[test]
    fn aborted_message_does_not_repeat_its_cause() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Dockerfile")).unwrap();

        let mut prompt = NoPrompt;
        let mut out = Vec::new();
        let mut console = Vec::new();
        let session = Session::new(tmp.path(), Policy::force(), &mut prompt, &mut out, &mut console);
        let aborted = run(session, &[], &[Artifact::literal("Dockerfile", "FROM node\n")]).unwrap_err();

        assert_eq!(aborted.to_string(), "run aborted");
        let cause = std::error::Error::source(&aborted).unwrap().to_string();
        assert!(cause.contains("Dockerfile"), "{cause}");
    }
}
