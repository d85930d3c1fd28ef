//! Stevedore core library: domain types, deep merge, project config, errors.
//!
//! - [`types`]: policy, artifact, decision and ledger entry types
//! - [`merge`]: template/overlay deep merge
//! - [`config`]: `stevedore.yaml` and user defaults
//! - [`error`]: [`CoreError`], [`ArtifactError`]

pub mod config;
pub mod error;
pub mod merge;
pub mod types;

pub use config::{ProjectConfig, UserDefaults, PROJECT_CONFIG_FILE};
pub use error::{ArtifactError, CoreError};
pub use merge::deep_merge;
pub use types::{
    AppName, Artifact, ArtifactContent, DeployTarget, LedgerEntry, OverwriteMode, Policy,
    WriteDecision,
};
