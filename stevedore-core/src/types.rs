//! Domain types for Stevedore.
//!
//! All path fields use `PathBuf`. Artifact and ledger paths are relative to
//! the project root; only the reconciler joins them onto a root.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::ArtifactError;
use crate::merge::deep_merge;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed application name (container, service and release name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppName(pub String);

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AppName {
    /// Derive a DNS-1123 friendly name from an arbitrary string (usually the
    /// project directory name or `package.json` `name`).
    pub fn sanitized(raw: &str) -> Self {
        let raw = raw.rsplit('/').next().unwrap_or(raw);
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }
        let trimmed = out.trim_matches('-');
        if trimmed.is_empty() {
            Self::from("app")
        } else {
            Self(trimmed.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Deploy target
// ---------------------------------------------------------------------------

/// Where the generated project is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeployTarget {
    #[default]
    Compose,
    Kubernetes,
}

impl DeployTarget {
    /// Config directories the target needs before its artifacts are written.
    pub fn config_dirs(&self) -> &'static [&'static str] {
        match self {
            DeployTarget::Compose => &[],
            DeployTarget::Kubernetes => &["k8s"],
        }
    }
}

impl fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployTarget::Compose => write!(f, "compose"),
            DeployTarget::Kubernetes => write!(f, "kubernetes"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation policy
// ---------------------------------------------------------------------------

/// How existing, differing files are treated. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting.
    #[default]
    Interactive,
    /// Never ask; never overwrite a differing file.
    NonInteractive,
    /// Always write.
    Force,
}

/// Reconciliation policy for one run.
///
/// `dry_run` is orthogonal to `mode` and, when set, short-circuits it:
/// content goes to the output stream and nothing on disk is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    pub mode: OverwriteMode,
    pub dry_run: bool,
}

impl Policy {
    pub fn interactive() -> Self {
        Self {
            mode: OverwriteMode::Interactive,
            dry_run: false,
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            mode: OverwriteMode::NonInteractive,
            dry_run: false,
        }
    }

    pub fn force() -> Self {
        Self {
            mode: OverwriteMode::Force,
            dry_run: false,
        }
    }

    /// Same mode, with dry-run switched on or off.
    pub fn with_dry_run(self, dry_run: bool) -> Self {
        Self { dry_run, ..self }
    }
}

// ---------------------------------------------------------------------------
// Decisions and ledger entries
// ---------------------------------------------------------------------------

/// Outcome of one reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    /// Nothing written: content identical, user declined, or overwrite refused.
    Skip,
    /// Content persisted (or streamed in dry-run).
    Write,
    /// The user asked to see a diff; the decision restarts for the same artifact.
    AbortRetry,
}

/// A filesystem object created during the current run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerEntry {
    File(PathBuf),
    Dir(PathBuf),
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Where an artifact's content comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactContent {
    /// Text used as-is.
    Literal(String),
    /// A structured template with a property overlay deep-merged on top.
    Merged { template: Value, overlay: Value },
}

/// A single file Stevedore may create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Path relative to the project root.
    pub path: PathBuf,
    pub content: ArtifactContent,
}

impl Artifact {
    pub fn literal(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Artifact {
            path: path.into(),
            content: ArtifactContent::Literal(content.into()),
        }
    }

    /// A template-derived artifact. A `Value::Null` overlay means "no overlay".
    pub fn merged(path: impl Into<PathBuf>, template: Value, overlay: Value) -> Self {
        Artifact {
            path: path.into(),
            content: ArtifactContent::Merged { template, overlay },
        }
    }

    /// Build an artifact from optional sources, enforcing that exactly one
    /// content source is supplied.
    pub fn from_sources(
        path: impl Into<PathBuf>,
        literal: Option<String>,
        template: Option<Value>,
        overlay: Option<Value>,
    ) -> Result<Self, ArtifactError> {
        let path = path.into();
        ensure_relative(&path)?;
        match (literal, template) {
            (Some(_), Some(_)) => Err(ArtifactError::ConflictingContent { path }),
            (Some(_), None) if overlay.is_some() => {
                Err(ArtifactError::ConflictingContent { path })
            }
            (None, None) => Err(ArtifactError::MissingContent { path }),
            (Some(text), None) => Ok(Artifact::literal(path, text)),
            (None, Some(template)) => Ok(Artifact::merged(
                path,
                template,
                overlay.unwrap_or(Value::Null),
            )),
        }
    }

    /// Fully resolve the desired content.
    pub fn resolve(&self) -> Result<String, ArtifactError> {
        ensure_relative(&self.path)?;
        match &self.content {
            ArtifactContent::Literal(text) => Ok(text.clone()),
            ArtifactContent::Merged { template, overlay } => {
                let merged = if overlay.is_null() {
                    template.clone()
                } else {
                    deep_merge(template.clone(), overlay.clone())
                };
                serde_yaml::to_string(&merged).map_err(|source| ArtifactError::Serialize {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }
}

/// Reject absolute paths and paths that climb out of the project root.
pub fn ensure_relative(path: &Path) -> Result<(), ArtifactError> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes || path.as_os_str().is_empty() {
        return Err(ArtifactError::NotRelative {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
