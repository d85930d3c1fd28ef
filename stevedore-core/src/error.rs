//! Error types for stevedore-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or saving configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors from constructing or resolving an [`Artifact`](crate::Artifact).
///
/// These are programmer errors and are raised before any filesystem access.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {path} has both literal content and a template")]
    ConflictingContent { path: PathBuf },

    #[error("artifact {path} has neither literal content nor a template")]
    MissingContent { path: PathBuf },

    #[error("artifact path {path} must be relative to the project root")]
    NotRelative { path: PathBuf },

    #[error("failed to serialize merged content for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
