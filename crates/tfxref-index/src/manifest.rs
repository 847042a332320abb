//! Module manifest parsing.
//!
//! `terraform init` records where it installed every non-local module in
//! `.terraform/modules/modules.json`. Entries are keyed by the dotted call
//! path (`vpc`, `vpc.subnets`), with the root module under the empty key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tfxref_core::TfxrefError;

/// One installed module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Dotted call path from the root.
    #[serde(rename = "Key")]
    pub key: String,
    /// Source address as written in the calling `module` block.
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Install directory, relative to the root module.
    #[serde(rename = "Dir")]
    pub dir: String,
}

#[derive(Debug, Deserialize)]
struct ManifestDoc {
    #[serde(rename = "Modules", default)]
    modules: Vec<ManifestEntry>,
}

/// Parsed module manifest.
#[derive(Debug, Clone, Default)]
pub struct ModuleManifest {
    root: PathBuf,
    entries: HashMap<String, ManifestEntry>,
}

impl ModuleManifest {
    /// Empty manifest: every non-local source is unresolvable.
    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: HashMap::new(),
        }
    }

    /// Parse manifest JSON; directories resolve relative to `root`.
    pub fn parse(root: &Path, json: &str) -> Result<Self, TfxrefError> {
        let doc: ManifestDoc = serde_json::from_str(json)?;
        let entries = doc
            .modules
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// Read the manifest at `root/relative`. A missing file gives an empty
    /// manifest; a malformed one is an error.
    pub fn load(root: &Path, relative: &str) -> Result<Self, TfxrefError> {
        let path = root.join(relative);
        if !path.exists() {
            tracing::debug!("No module manifest at {}", path.display());
            return Ok(Self::empty(root));
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(root, &content)
    }

    /// Entry for the module at `path` (call keys from the root).
    pub fn entry(&self, path: &[String]) -> Option<&ManifestEntry> {
        self.entries.get(&path.join("."))
    }

    /// Install directory of the module at `path`.
    pub fn module_dir(&self, path: &[String]) -> Option<PathBuf> {
        self.entry(path).map(|e| self.root.join(&e.dir))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
