//! Module identity assignment.
//!
//! Identities are a pure function of a node's call path and the source
//! address it was called with. The root is detected by position in the tree,
//! never by content, and always maps to [`ModuleIdentity::ROOT`].

use std::collections::HashMap;
use std::sync::Mutex;
use tfxref_core::{ModuleId, ModuleIdentity, ModuleTree, TfxrefError};

/// Identity for a module at `path`, called with `source_address`.
///
/// An empty path is the root, whatever source address accompanies it: vertices
/// that close the root module carry one in some graph builders and must not
/// turn into a nested identity.
pub fn identity_of(
    path: &[String],
    source_address: Option<&str>,
) -> Result<ModuleIdentity, TfxrefError> {
    if path.is_empty() {
        return Ok(ModuleIdentity::root());
    }
    match source_address {
        Some(source) => Ok(ModuleIdentity::nested(source, path)),
        None => Err(TfxrefError::FatalIdentity(format!(
            "nested module module.{} has no source address",
            path.join(".module.")
        ))),
    }
}

/// Identity of a node in `tree`, cross-checking root detection.
pub fn identity_of_node(tree: &ModuleTree, id: ModuleId) -> Result<ModuleIdentity, TfxrefError> {
    let node = tree
        .get(id)
        .ok_or_else(|| TfxrefError::FatalIdentity(format!("unknown module node {id}")))?;
    let positional_root = tree.is_root(id);
    if positional_root != node.path().is_empty() {
        return Err(TfxrefError::FatalIdentity(format!(
            "root detection disagrees for {id}: is_root={positional_root}, path={:?}",
            node.path()
        )));
    }
    if positional_root && node.parent().is_some() {
        return Err(TfxrefError::FatalIdentity(format!(
            "root module {id} has a parent"
        )));
    }
    identity_of(node.path(), node.source_address.as_deref())
}

/// Records which node owns each identity handed out during a run.
///
/// Shared between workers in the parallel walk; a second node claiming an
/// identity, or one node presenting two identities, is fatal.
#[derive(Debug, Default)]
pub struct IdentityLedger {
    entries: Mutex<LedgerEntries>,
}

#[derive(Debug, Default)]
struct LedgerEntries {
    by_identity: HashMap<ModuleIdentity, ModuleId>,
    by_node: HashMap<ModuleId, ModuleIdentity>,
}

impl IdentityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `identity` for `node`. Claiming the same pair again is a no-op.
    pub fn record(&self, node: ModuleId, identity: &ModuleIdentity) -> Result<(), TfxrefError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?;

        if let Some(owner) = entries.by_identity.get(identity) {
            if *owner != node {
                return Err(TfxrefError::FatalIdentity(format!(
                    "identity {identity} computed for both {owner} and {node}"
                )));
            }
        }
        if let Some(previous) = entries.by_node.get(&node) {
            if previous != identity {
                return Err(TfxrefError::FatalIdentity(format!(
                    "{node} computed as both {previous} and {identity}"
                )));
            }
        }

        entries.by_identity.insert(identity.clone(), node);
        entries.by_node.insert(node, identity.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|e| e.by_identity.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
