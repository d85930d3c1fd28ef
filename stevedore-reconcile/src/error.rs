//! Error types for stevedore-reconcile.

use std::path::PathBuf;

use thiserror::Error;

use stevedore_core::ArtifactError;

/// Errors raised while reconciling or provisioning. All of them are fatal for
/// the run; the orchestrator decides whether to roll back.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An I/O error, annotated with the path relative to the project root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be resolved (conflicting sources, bad path).
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The prompt gateway could not obtain an answer.
    #[error("prompt for {path} failed: {message}")]
    Prompt { path: PathBuf, message: String },
}

/// Convenience constructor for [`ReconcileError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.into(),
        source,
    }
}
