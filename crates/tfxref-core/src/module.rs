//! In-memory module tree: declarations per module and the call hierarchy.
//!
//! Nodes live in an arena owned by [`ModuleTree`]. A node owns its
//! declarations; the parent link is an id used for navigation only, so the
//! tree has exactly one owner per node and no cycles.

use crate::expr::{Body, Expr};
use crate::schema::ValueType;
use crate::types::{ProviderAddr, Referrer, ResourceMode, SourceRange};
use crate::TfxrefError;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ── Declarations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Declared type constraint; `None` when the declaration has no `type`.
    pub value_type: Option<ValueType>,
    pub default: Option<Expr>,
    pub range: SourceRange,
}

impl Variable {
    /// A variable without a default must be set by every caller.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub expr: Expr,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub name: String,
    pub expr: Expr,
    pub range: SourceRange,
}

/// `provider = aws.west` on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRef {
    pub local_name: String,
    pub alias: Option<String>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
    pub provider: Option<ProviderRef>,
    /// Body with meta-arguments removed.
    pub config: Body,
    pub count: Option<Expr>,
    pub for_each: Option<Expr>,
    pub depends_on: Vec<Expr>,
    pub range: SourceRange,
}

impl Resource {
    /// `aws_instance.web` or `data.aws_ami.ubuntu`.
    pub fn address(&self) -> String {
        self.referrer().to_string()
    }

    pub fn referrer(&self) -> Referrer {
        Referrer::Resource {
            mode: self.mode,
            type_name: self.type_name.clone(),
            name: self.name.clone(),
        }
    }

    /// Provider local name: explicit `provider` argument, else the type prefix.
    pub fn provider_local_name(&self) -> &str {
        match &self.provider {
            Some(p) => &p.local_name,
            None => self
                .type_name
                .split_once('_')
                .map(|(prefix, _)| prefix)
                .unwrap_or(&self.type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleCall {
    pub name: String,
    pub source_address: String,
    pub version: Option<String>,
    /// Argument body with meta-arguments removed.
    pub config: Body,
    pub count: Option<Expr>,
    pub for_each: Option<Expr>,
    pub depends_on: Vec<Expr>,
    pub range: SourceRange,
}

impl ModuleCall {
    pub fn referrer(&self) -> Referrer {
        Referrer::ModuleCall {
            name: self.name.clone(),
        }
    }
}

/// Everything declared directly in one module directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub dir: Option<PathBuf>,
    pub variables: Vec<Variable>,
    pub locals: Vec<Local>,
    pub outputs: Vec<Output>,
    pub resources: Vec<Resource>,
    pub module_calls: Vec<ModuleCall>,
    /// `required_providers` local name to source address.
    pub required_providers: BTreeMap<String, ProviderAddr>,
}

impl Module {
    pub fn module_call(&self, name: &str) -> Option<&ModuleCall> {
        self.module_calls.iter().find(|c| c.name == name)
    }

    /// Provider that owns the resource's schema.
    pub fn provider_for(&self, resource: &Resource) -> ProviderAddr {
        let local = resource.provider_local_name();
        self.required_providers
            .get(local)
            .cloned()
            .unwrap_or_else(|| ProviderAddr::implied(local))
    }
}

// ── Tree ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mod_{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ModuleNode {
    id: ModuleId,
    parent: Option<ModuleId>,
    path: Vec<String>,
    pub source_address: Option<String>,
    children: BTreeMap<String, ModuleId>,
    pub module: Module,
}

impl ModuleNode {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn parent(&self) -> Option<ModuleId> {
        self.parent
    }

    /// Call keys from the root to this node; empty for the root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn children(&self) -> &BTreeMap<String, ModuleId> {
        &self.children
    }

    /// `module.a.module.b`, or an empty string for the root.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|step| format!("module.{step}"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Arena of module nodes. Node 0 is always the root.
#[derive(Debug, Clone)]
pub struct ModuleTree {
    nodes: Vec<ModuleNode>,
}

impl ModuleTree {
    pub fn new(root: Module) -> Self {
        Self {
            nodes: vec![ModuleNode {
                id: ModuleId(0),
                parent: None,
                path: Vec::new(),
                source_address: None,
                children: BTreeMap::new(),
                module: root,
            }],
        }
    }

    pub fn root(&self) -> ModuleId {
        ModuleId(0)
    }

    pub fn root_node(&self) -> &ModuleNode {
        &self.nodes[0]
    }

    /// Position-in-tree check, independent of module content.
    pub fn is_root(&self, id: ModuleId) -> bool {
        id == self.root()
    }

    pub fn get(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut ModuleNode> {
        self.nodes.get_mut(id.0)
    }

    /// Attach `module` as the child of `parent` under `call_key`.
    pub fn add_child(
        &mut self,
        parent: ModuleId,
        call_key: &str,
        source_address: impl Into<String>,
        module: Module,
    ) -> Result<ModuleId, TfxrefError> {
        let id = ModuleId(self.nodes.len());
        let parent_node = self
            .nodes
            .get_mut(parent.0)
            .ok_or_else(|| TfxrefError::NotFound(format!("module node {parent}")))?;
        if parent_node.children.contains_key(call_key) {
            let at = parent_node.path_string();
            return Err(TfxrefError::DuplicateModuleCall(if at.is_empty() {
                format!("module.{call_key}")
            } else {
                format!("{at}.module.{call_key}")
            }));
        }
        parent_node.children.insert(call_key.to_string(), id);
        let mut path = parent_node.path.clone();
        path.push(call_key.to_string());

        self.nodes.push(ModuleNode {
            id,
            parent: Some(parent),
            path,
            source_address: Some(source_address.into()),
            children: BTreeMap::new(),
            module,
        });
        Ok(id)
    }

    pub fn parent_of(&self, id: ModuleId) -> Option<&ModuleNode> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    pub fn child(&self, id: ModuleId, call_key: &str) -> Option<&ModuleNode> {
        self.get(id)?
            .children
            .get(call_key)
            .and_then(|c| self.get(*c))
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
