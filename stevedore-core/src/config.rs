//! Project configuration (`stevedore.yaml`) and user-level defaults.
//!
//! # Storage layout
//!
//! ```text
//! <project>/stevedore.yaml      answers for this project (reconciled like any artifact)
//! ~/.stevedore/config.yaml      user defaults (registry prefix, default target)
//! ```
//!
//! Every loader has two forms, as in the rest of the workspace:
//! - `fn_at(root: &Path, …)`: explicit root; used in tests with `TempDir`
//! - `fn(…)`: derives the home directory from `dirs::home_dir()`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{io_err, CoreError};
use crate::types::{AppName, DeployTarget};

/// File name of the per-project config, relative to the project root.
pub const PROJECT_CONFIG_FILE: &str = "stevedore.yaml";

fn default_replicas() -> u32 {
    1
}

/// Persisted deployment answers for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: AppName,
    #[serde(default)]
    pub target: DeployTarget,
    pub port: u16,
    pub image: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Per-artifact overlays, keyed by the artifact's relative path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, Value>,
}

impl ProjectConfig {
    /// `<root>/stevedore.yaml`. Pure, no I/O.
    pub fn path_at(root: &Path) -> PathBuf {
        root.join(PROJECT_CONFIG_FILE)
    }

    /// Load the project config if one exists.
    ///
    /// Returns `Ok(None)` when the file is absent and `CoreError::Parse`
    /// (with the path) when it is malformed.
    pub fn load_at(root: &Path) -> Result<Option<ProjectConfig>, CoreError> {
        let path = Self::path_at(root);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        serde_yaml::from_str(&contents)
            .map(Some)
            .map_err(|source| CoreError::Parse { path, source })
    }

    /// Serialize for writing through the reconciler.
    pub fn to_yaml(&self) -> Result<String, CoreError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Overlay configured for the artifact at `rel_path`, if any.
    pub fn overlay_for(&self, rel_path: &Path) -> Option<&Value> {
        let key = rel_path.to_string_lossy().replace('\\', "/");
        self.overrides.get(&key)
    }
}

/// User-level defaults from `~/.stevedore/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDefaults {
    /// Registry prefix prepended to generated image names (e.g. `ghcr.io/acme`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DeployTarget>,
}

impl UserDefaults {
    /// `<home>/.stevedore/config.yaml`
    pub fn path_at(home: &Path) -> PathBuf {
        home.join(".stevedore").join("config.yaml")
    }

    /// Load user defaults; a missing file yields [`UserDefaults::default`].
    pub fn load_at(home: &Path) -> Result<UserDefaults, CoreError> {
        let path = Self::path_at(home);
        if !path.exists() {
            return Ok(UserDefaults::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })
    }

    /// `load_at` convenience wrapper.
    pub fn load() -> Result<UserDefaults, CoreError> {
        let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
        Self::load_at(&home)
    }

    /// Qualify a bare image name with the configured registry.
    pub fn qualify_image(&self, image: &str) -> String {
        match self.registry.as_deref() {
            Some(registry) if !image.contains('/') => {
                format!("{}/{}", registry.trim_end_matches('/'), image)
            }
            _ => image.to_string(),
        }
    }
}
