//! Persistent configuration for tfxref.
//!
//! Loads/saves a TOML config at `~/.tfxref/config.toml`.

use crate::TfxrefError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level tfxref configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfxrefConfig {
    pub index: IndexConfig,
    pub loader: LoaderConfig,
    pub output: OutputConfig,
}

impl TfxrefConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, TfxrefError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TfxrefError::Config(e.to_string()))
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<(), TfxrefError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| TfxrefError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the default path, or return defaults if the file doesn't exist.
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Default config path: `~/.tfxref/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tfxref")
            .join("config.toml")
    }
}

/// Indexer behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// 0 walks the tree recursively on the calling thread; N > 0 visits
    /// module vertices on N worker threads.
    pub workers: usize,
    /// Also extract references from `count`, `for_each` and `depends_on`.
    pub meta_arguments: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            meta_arguments: true,
        }
    }
}

/// Module loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Configuration file extensions read from each module directory.
    pub extensions: Vec<String>,
    /// Ignore `*_override.tf` files.
    pub skip_overrides: bool,
    /// Module manifest written by `terraform init`, relative to the root module.
    pub manifest_path: String,
    /// Deepest module nesting followed before giving up.
    pub max_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["tf".to_string()],
            skip_overrides: true,
            manifest_path: ".terraform/modules/modules.json".to_string(),
            max_depth: 64,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Provider schemas as printed by `terraform providers schema -json`.
    pub schemas_path: Option<String>,
    /// Exit with a failure status when any error diagnostic was recorded.
    pub fail_on_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schemas_path: None,
            fail_on_error: true,
        }
    }
}
