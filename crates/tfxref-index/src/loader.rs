//! Module loader: reads module directories into a [`ModuleTree`].
//!
//! Each directory is read non-recursively; its `.tf` files are parsed and the
//! top-level blocks decoded into declarations. Module calls are then followed
//! depth-first, in declaration order, so node ids are stable across runs.
//! Anything the loader cannot make sense of becomes a diagnostic: the tree it
//! returns is always usable, if sometimes incomplete.

use crate::manifest::ModuleManifest;
use crate::parser::{HclParser, ParsedFile};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tfxref_core::{
    Block, Diagnostic, DiagnosticKind, Diagnostics, Expr, LiteralValue, LoaderConfig,
    Local, Module, ModuleCall, ModuleId, ModuleTree, Output, ProviderAddr, ProviderRef, Resource,
    ResourceMode, TfxrefError, TraverseStep, ValueType, Variable,
};

/// Result of loading a configuration tree.
#[derive(Debug)]
pub struct LoadResult {
    pub tree: ModuleTree,
    pub diagnostics: Diagnostics,
}

/// Reads a root module directory and everything it calls.
pub struct ModuleLoader {
    parser: HclParser,
    config: LoaderConfig,
}

impl ModuleLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            parser: HclParser::with_extensions(config.extensions.clone()),
            config,
        }
    }

    /// Load the module tree rooted at `root_dir`.
    pub fn load(&self, root_dir: &Path) -> Result<LoadResult, TfxrefError> {
        if !root_dir.is_dir() {
            return Err(TfxrefError::NotFound(format!(
                "module directory {}",
                root_dir.display()
            )));
        }
        let manifest = ModuleManifest::load(root_dir, &self.config.manifest_path)?;
        let mut diagnostics = Diagnostics::new();

        let root = self.load_module(root_dir, root_dir, &mut diagnostics);
        let mut tree = ModuleTree::new(root);
        let root_id = tree.root();
        let ancestors = vec![canonical(root_dir)];
        self.load_children(
            &mut tree,
            root_id,
            root_dir,
            root_dir,
            &ancestors,
            &manifest,
            &mut diagnostics,
        )?;

        tracing::info!(
            "Loaded {} modules from {} ({} diagnostics)",
            tree.len(),
            root_dir.display(),
            diagnostics.len()
        );
        Ok(LoadResult { tree, diagnostics })
    }

    #[allow(clippy::too_many_arguments)]
    fn load_children(
        &self,
        tree: &mut ModuleTree,
        parent: ModuleId,
        parent_dir: &Path,
        root_dir: &Path,
        ancestors: &[PathBuf],
        manifest: &ModuleManifest,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), TfxrefError> {
        let Some(parent_node) = tree.get(parent) else {
            return Err(TfxrefError::NotFound(format!("module node {parent}")));
        };
        let parent_path = parent_node.path().to_vec();
        let calls: Vec<(String, String, tfxref_core::SourceRange)> = parent_node
            .module
            .module_calls
            .iter()
            .filter(|c| !c.source_address.is_empty())
            .map(|c| (c.name.clone(), c.source_address.clone(), c.range.clone()))
            .collect();

        for (name, source, range) in calls {
            let mut path = parent_path.clone();
            path.push(name.clone());

            if path.len() > self.config.max_depth {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Structural,
                        "Module nesting too deep",
                        format!(
                            "module.{} exceeds the maximum depth of {}",
                            path.join(".module."),
                            self.config.max_depth
                        ),
                    )
                    .with_subject(range),
                );
                continue;
            }

            let Some(dir) = resolve_source(&source, parent_dir, &path, manifest) else {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::Structural,
                        "Module not installed",
                        format!(
                            "module {name:?} with source {source:?} is neither a local path nor \
                             listed in the module manifest"
                        ),
                    )
                    .with_subject(range),
                );
                continue;
            };
            if !dir.is_dir() {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Structural,
                        "Module directory not found",
                        format!("module {name:?} resolves to {}", dir.display()),
                    )
                    .with_subject(range),
                );
                continue;
            }
            let key = canonical(&dir);
            if ancestors.contains(&key) {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Structural,
                        "Module cycle",
                        format!("module {name:?} calls {} which is already being loaded", dir.display()),
                    )
                    .with_subject(range),
                );
                continue;
            }

            tracing::debug!("Loading module.{} from {}", path.join(".module."), dir.display());
            let module = self.load_module(&dir, root_dir, diagnostics);
            let child = tree.add_child(parent, &name, source, module)?;

            let mut chain = ancestors.to_vec();
            chain.push(key);
            self.load_children(tree, child, &dir, root_dir, &chain, manifest, diagnostics)?;
        }
        Ok(())
    }

    /// Parse and decode every configuration file directly inside `dir`.
    pub fn load_module(&self, dir: &Path, root_dir: &Path, diagnostics: &mut Diagnostics) -> Module {
        let mut decoder = Decoder::new(diagnostics);
        for path in self.config_files(dir) {
            let filename = path
                .strip_prefix(root_dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            let content = match std::fs::read(&path) {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), err);
                    decoder.diagnostics.push(Diagnostic::error(
                        DiagnosticKind::Structural,
                        "Unreadable configuration file",
                        format!("{filename}: {err}"),
                    ));
                    continue;
                }
            };
            match self.parser.parse_file(&filename, &content) {
                Ok(parsed) => decoder.file(parsed),
                Err(err) => {
                    tracing::warn!("Failed to parse {}: {}", filename, err);
                    decoder.diagnostics.push(Diagnostic::error(
                        DiagnosticKind::Syntax,
                        "Unparseable configuration file",
                        format!("{filename}: {err}"),
                    ));
                }
            }
        }
        let mut module = decoder.finish();
        module.dir = Some(dir.to_path_buf());
        module
    }

    /// Configuration files in `dir`, sorted by name.
    fn config_files(&self, dir: &Path) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(dir)
            .max_depth(Some(1))
            .hidden(true) // skip hidden files
            .git_ignore(false) // Terraform reads files regardless of VCS ignores
            .git_global(false)
            .git_exclude(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("Walk error: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let path = entry.path();
            if !self.parser.supports_path(path) {
                continue;
            }
            if self.config.skip_overrides && is_override_file(path) {
                tracing::debug!("Skipping override file {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }
        files
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

fn is_override_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem == "override" || stem.ends_with("_override"))
}

fn canonical(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

fn is_local_source(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../") || source == "." || source == ".."
}

/// Directory holding the module called at `path` with `source`.
fn resolve_source(
    source: &str,
    parent_dir: &Path,
    path: &[String],
    manifest: &ModuleManifest,
) -> Option<PathBuf> {
    if is_local_source(source) {
        // A local call inside an installed module may also be listed in the
        // manifest; the caller's directory is authoritative either way.
        return Some(parent_dir.join(source));
    }
    manifest.module_dir(path)
}

// ── Declaration Decoding ────────────────────────────────────────────────────

/// Meta-arguments of resource blocks, kept out of the configuration body.
const RESOURCE_META_BLOCKS: &[&str] = &["lifecycle", "provisioner", "connection"];

struct Decoder<'d> {
    module: Module,
    diagnostics: &'d mut Diagnostics,
    seen: HashSet<(&'static str, String)>,
}

impl<'d> Decoder<'d> {
    fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            module: Module::default(),
            diagnostics,
            seen: HashSet::new(),
        }
    }

    fn finish(self) -> Module {
        self.module
    }

    fn structural(&mut self, summary: &str, detail: String, range: &tfxref_core::SourceRange) {
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Structural, summary, detail)
                .with_subject(range.clone()),
        );
    }

    /// Record a declaration name; false if it was already declared.
    fn claim(&mut self, kind: &'static str, name: &str, range: &tfxref_core::SourceRange) -> bool {
        if self.seen.insert((kind, name.to_string())) {
            return true;
        }
        self.structural(
            "Duplicate declaration",
            format!("a {kind} named {name:?} was already declared in this module"),
            range,
        );
        false
    }

    fn file(&mut self, parsed: ParsedFile) {
        self.diagnostics.extend(parsed.diagnostics);
        for attr in &parsed.body.attributes {
            self.structural(
                "Unsupported argument",
                format!("top-level argument {:?} is not expected here", attr.name),
                &attr.name_range,
            );
        }
        for block in parsed.body.blocks {
            self.block(block);
        }
    }

    fn block(&mut self, block: Block) {
        let wanted = match block.type_name.as_str() {
            "variable" | "output" | "module" | "provider" => 1,
            "resource" | "data" => 2,
            "locals" | "terraform" => 0,
            other => {
                tracing::debug!("Ignoring {} block", other);
                return;
            }
        };
        if block.labels.len() != wanted {
            self.structural(
                "Wrong number of block labels",
                format!(
                    "a {} block needs {wanted} label(s), found {}",
                    block.type_name,
                    block.labels.len()
                ),
                &block.type_range,
            );
            return;
        }

        match block.type_name.as_str() {
            "variable" => self.variable(block),
            "locals" => self.locals(block),
            "output" => self.output(block),
            "resource" => self.resource(ResourceMode::Managed, block),
            "data" => self.resource(ResourceMode::Data, block),
            "module" => self.module_call(block),
            "terraform" => self.terraform(block),
            _ => {}
        }
    }

    fn variable(&mut self, block: Block) {
        let name = block.labels[0].clone();
        if !self.claim("variable", &name, &block.range) {
            return;
        }
        let value_type = block
            .body
            .attribute("type")
            .map(|a| type_constraint(&a.expr));
        let default = block.body.attribute("default").map(|a| a.expr.clone());
        self.module.variables.push(Variable {
            name,
            value_type,
            default,
            range: block.range,
        });
    }

    fn locals(&mut self, block: Block) {
        for attr in block.body.attributes {
            if !self.claim("local value", &attr.name, &attr.range) {
                continue;
            }
            self.module.locals.push(Local {
                name: attr.name,
                expr: attr.expr,
                range: attr.range,
            });
        }
    }

    fn output(&mut self, mut block: Block) {
        let name = block.labels[0].clone();
        let Some(value) = block.body.take_attribute("value") else {
            self.structural(
                "Missing required argument",
                format!("output {name:?} has no value"),
                &block.range,
            );
            return;
        };
        if !self.claim("output", &name, &block.range) {
            return;
        }
        self.module.outputs.push(Output {
            name,
            expr: value.expr,
            range: block.range,
        });
    }

    fn resource(&mut self, mode: ResourceMode, mut block: Block) {
        let type_name = block.labels[0].clone();
        let name = block.labels[1].clone();
        let kind = match mode {
            ResourceMode::Managed => "resource",
            ResourceMode::Data => "data resource",
        };
        if !self.claim(kind, &format!("{type_name}.{name}"), &block.range) {
            return;
        }

        let body = &mut block.body;
        let count = body.take_attribute("count").map(|a| a.expr);
        let for_each = body.take_attribute("for_each").map(|a| a.expr);
        let depends_on = body
            .take_attribute("depends_on")
            .map(|a| expr_list(a.expr))
            .unwrap_or_default();
        let provider = match body.take_attribute("provider") {
            Some(attr) => match provider_ref(&attr.expr) {
                Some(p) => Some(p),
                None => {
                    self.structural(
                        "Invalid provider reference",
                        "expected a provider local name, optionally followed by an alias"
                            .to_string(),
                        &attr.range,
                    );
                    None
                }
            },
            None => None,
        };
        for meta in RESOURCE_META_BLOCKS {
            block.body.take_blocks(meta);
        }

        self.module.resources.push(Resource {
            mode,
            type_name,
            name,
            provider,
            config: block.body,
            count,
            for_each,
            depends_on,
            range: block.range,
        });
    }

    fn module_call(&mut self, mut block: Block) {
        let name = block.labels[0].clone();
        if !self.claim("module call", &name, &block.range) {
            return;
        }
        let body = &mut block.body;
        let source_address = match body.take_attribute("source") {
            Some(attr) => match attr.expr.as_static_string() {
                Some(s) => s,
                None => {
                    self.structural(
                        "Invalid module source",
                        format!("module {name:?} source must be a literal string"),
                        &attr.range,
                    );
                    String::new()
                }
            },
            None => {
                self.structural(
                    "Missing required argument",
                    format!("module {name:?} has no source"),
                    &block.range,
                );
                String::new()
            }
        };
        let body = &mut block.body;
        let version = body
            .take_attribute("version")
            .and_then(|a| a.expr.as_static_string());
        let count = body.take_attribute("count").map(|a| a.expr);
        let for_each = body.take_attribute("for_each").map(|a| a.expr);
        let depends_on = body
            .take_attribute("depends_on")
            .map(|a| expr_list(a.expr))
            .unwrap_or_default();
        body.take_attribute("providers");

        self.module.module_calls.push(ModuleCall {
            name,
            source_address,
            version,
            config: block.body,
            count,
            for_each,
            depends_on,
            range: block.range,
        });
    }

    fn terraform(&mut self, block: Block) {
        for required in block
            .body
            .blocks
            .iter()
            .filter(|b| b.type_name == "required_providers")
        {
            for attr in &required.body.attributes {
                let source = match &attr.expr {
                    Expr::Object { items, .. } => items
                        .iter()
                        .find(|i| i.key.as_static_string().as_deref() == Some("source"))
                        .and_then(|i| i.value.as_static_string()),
                    // Legacy form: a bare version constraint string.
                    _ => None,
                };
                let addr = match source {
                    Some(s) => match s.parse::<ProviderAddr>() {
                        Ok(addr) => addr,
                        Err(err) => {
                            self.structural(
                                "Invalid provider source",
                                format!("{}: {err}", attr.name),
                                &attr.range,
                            );
                            continue;
                        }
                    },
                    None => ProviderAddr::implied(&attr.name),
                };
                self.module.required_providers.insert(attr.name.clone(), addr);
            }
        }
    }
}

/// `aws` or `aws.west`.
fn provider_ref(expr: &Expr) -> Option<ProviderRef> {
    let traversal = expr.as_traversal()?;
    let alias = match traversal.steps.as_slice() {
        [] => None,
        [TraverseStep::Attr { name, .. }] => Some(name.clone()),
        _ => return None,
    };
    Some(ProviderRef {
        local_name: traversal.root.clone(),
        alias,
        range: traversal.range(),
    })
}

fn expr_list(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Tuple { items, .. } => items,
        other => vec![other],
    }
}

/// Decode a type constraint expression. Anything unrecognized is `any`.
pub fn type_constraint(expr: &Expr) -> ValueType {
    if let Some(keyword) = expr.as_keyword().map(str::to_string).or_else(|| match expr {
        // Pre-0.12 quoted constraints.
        Expr::Literal {
            value: LiteralValue::String(s),
            ..
        } => Some(s.clone()),
        Expr::Template { .. } => expr.as_static_string(),
        _ => None,
    }) {
        return match keyword.as_str() {
            "string" => ValueType::String,
            "number" => ValueType::Number,
            "bool" => ValueType::Bool,
            "list" => ValueType::List(Box::new(ValueType::Dynamic)),
            "map" => ValueType::Map(Box::new(ValueType::Dynamic)),
            _ => ValueType::Dynamic,
        };
    }

    let Expr::FunctionCall { name, args, .. } = expr else {
        return ValueType::Dynamic;
    };
    let element = || {
        args.first()
            .map(type_constraint)
            .unwrap_or(ValueType::Dynamic)
    };
    match name.as_str() {
        "list" => ValueType::List(Box::new(element())),
        "set" => ValueType::Set(Box::new(element())),
        "map" => ValueType::Map(Box::new(element())),
        "optional" => element(),
        "object" => match args.first() {
            Some(Expr::Object { items, .. }) => ValueType::Object(
                items
                    .iter()
                    .filter_map(|i| {
                        let key = i.key.as_static_string()?;
                        Some((key, type_constraint(&i.value)))
                    })
                    .collect(),
            ),
            _ => ValueType::Dynamic,
        },
        "tuple" => match args.first() {
            Some(Expr::Tuple { items, .. }) => {
                ValueType::Tuple(items.iter().map(type_constraint).collect())
            }
            _ => ValueType::Dynamic,
        },
        _ => ValueType::Dynamic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&path, content).expect("failed to write temp file");
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn parse_expr(src: &str) -> Expr {
        let parsed = HclParser::new()
            .parse_file("t.tf", format!("x = {src}\n").as_bytes())
            .unwrap();
        parsed.body.attributes[0].expr.clone()
    }

    #[test]
    fn decodes_declarations() {
        let dir = temp_dir("tfxref_loader_decode");
        write(
            &dir,
            "main.tf",
            r#"
terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 5.0"
    }
  }
}

variable "region" {
  type    = string
  default = "us-east-1"
}

variable "name" {}

locals {
  prefix = "${var.name}-app"
}

resource "aws_instance" "web" {
  count    = 2
  provider = aws.west
  ami      = data.aws_ami.ubuntu.id

  lifecycle {
    create_before_destroy = true
  }
}

data "aws_ami" "ubuntu" {
  owners = ["099720109477"]
}

output "id" {
  value = aws_instance.web[0].id
}
"#,
        );
        let result = ModuleLoader::default().load(&dir).unwrap();
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let module = &result.tree.root_node().module;

        assert_eq!(module.variables.len(), 2);
        assert!(!module.variables[0].is_required());
        assert_eq!(module.variables[0].value_type, Some(ValueType::String));
        assert!(module.variables[1].is_required());
        assert_eq!(module.locals.len(), 1);
        assert_eq!(module.outputs.len(), 1);
        assert_eq!(module.resources.len(), 2);

        let web = &module.resources[0];
        assert!(web.count.is_some());
        assert_eq!(web.provider.as_ref().unwrap().alias.as_deref(), Some("west"));
        assert!(web.config.attribute("count").is_none());
        assert!(web.config.blocks.is_empty(), "lifecycle must be separated");
        assert_eq!(web.range.filename, "main.tf");
        assert_eq!(module.resources[1].mode, ResourceMode::Data);

        assert_eq!(
            module.required_providers["aws"].to_string(),
            "registry.terraform.io/hashicorp/aws"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn follows_local_module_calls() {
        let dir = temp_dir("tfxref_loader_local");
        write(
            &dir,
            "main.tf",
            "module \"child\" {\n  source = \"./modules/child\"\n  count  = 1\n  y      = 3\n}\n",
        );
        write(&dir, "modules/child/main.tf", "variable \"y\" {}\n");

        let result = ModuleLoader::default().load(&dir).unwrap();
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(result.tree.len(), 2);

        let call = &result.tree.root_node().module.module_calls[0];
        assert_eq!(call.source_address, "./modules/child");
        assert!(call.config.attribute("source").is_none());
        assert!(call.config.attribute("count").is_none());
        assert!(call.config.attribute("y").is_some());

        let child = result.tree.child(result.tree.root(), "child").unwrap();
        assert_eq!(child.source_address.as_deref(), Some("./modules/child"));
        assert_eq!(child.module.variables[0].name, "y");
        assert_eq!(
            child.module.variables[0].range.filename,
            "modules/child/main.tf"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolves_registry_modules_through_manifest() {
        let dir = temp_dir("tfxref_loader_manifest");
        write(
            &dir,
            "main.tf",
            "module \"vpc\" {\n  source  = \"terraform-aws-modules/vpc/aws\"\n  version = \"5.1.0\"\n}\n",
        );
        write(
            &dir,
            ".terraform/modules/modules.json",
            r#"{"Modules":[{"Key":"","Source":"","Dir":"."},
                {"Key":"vpc","Source":"terraform-aws-modules/vpc/aws","Version":"5.1.0","Dir":".terraform/modules/vpc"}]}"#,
        );
        write(&dir, ".terraform/modules/vpc/main.tf", "variable \"cidr\" {\n  default = \"10.0.0.0/16\"\n}\n");

        let result = ModuleLoader::default().load(&dir).unwrap();
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let vpc = result.tree.child(result.tree.root(), "vpc").unwrap();
        assert_eq!(vpc.module.variables.len(), 1);
        assert_eq!(
            result.tree.root_node().module.module_calls[0].version.as_deref(),
            Some("5.1.0")
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unresolvable_and_cyclic_calls_are_structural() {
        let dir = temp_dir("tfxref_loader_broken");
        write(
            &dir,
            "main.tf",
            r#"
module "remote" {
  source = "git::https://example.com/mod.git"
}

module "self" {
  source = "./"
}
"#,
        );
        let result = ModuleLoader::default().load(&dir).unwrap();
        assert_eq!(result.tree.len(), 1);
        assert_eq!(
            result.diagnostics.of_kind(DiagnosticKind::Structural).count(),
            2
        );
        // Calls stay declared so their arguments can still be indexed.
        assert_eq!(result.tree.root_node().module.module_calls.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_declarations_keep_the_first() {
        let dir = temp_dir("tfxref_loader_duplicates");
        write(&dir, "a.tf", "variable \"x\" {}\n");
        write(&dir, "b.tf", "variable \"x\" {\n  default = 1\n}\n");
        let result = ModuleLoader::default().load(&dir).unwrap();
        let module = &result.tree.root_node().module;
        assert_eq!(module.variables.len(), 1);
        assert!(module.variables[0].is_required());
        assert_eq!(
            result.diagnostics.of_kind(DiagnosticKind::Structural).count(),
            1
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn override_files_are_skipped_by_default() {
        let dir = temp_dir("tfxref_loader_override");
        write(&dir, "main.tf", "locals {\n  a = 1\n}\n");
        write(&dir, "main_override.tf", "locals {\n  b = 2\n}\n");
        write(&dir, "notes.txt", "not terraform");

        let result = ModuleLoader::default().load(&dir).unwrap();
        assert_eq!(result.tree.root_node().module.locals.len(), 1);

        let config = LoaderConfig {
            skip_overrides: false,
            ..LoaderConfig::default()
        };
        let result = ModuleLoader::new(config).load(&dir).unwrap();
        assert_eq!(result.tree.root_node().module.locals.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_root_is_not_found() {
        let err = ModuleLoader::default()
            .load(Path::new("/nonexistent/tfxref/root"))
            .unwrap_err();
        assert!(matches!(err, TfxrefError::NotFound(_)));
    }

    #[test]
    fn type_constraints_decode() {
        assert_eq!(type_constraint(&parse_expr("number")), ValueType::Number);
        assert_eq!(type_constraint(&parse_expr("any")), ValueType::Dynamic);
        assert_eq!(
            type_constraint(&parse_expr("list(string)")),
            ValueType::List(Box::new(ValueType::String))
        );
        assert_eq!(
            type_constraint(&parse_expr("map(optional(bool))")),
            ValueType::Map(Box::new(ValueType::Bool))
        );
        match type_constraint(&parse_expr("object({ name = string, size = number })")) {
            ValueType::Object(fields) => {
                assert_eq!(fields["name"], ValueType::String);
                assert_eq!(fields["size"], ValueType::Number);
            }
            other => panic!("expected object, got {other:?}"),
        }
        assert_eq!(
            type_constraint(&parse_expr("tuple([string, number])")),
            ValueType::Tuple(vec![ValueType::String, ValueType::Number])
        );
        assert_eq!(type_constraint(&parse_expr("\"string\"")), ValueType::String);
        assert_eq!(type_constraint(&parse_expr("weird(1)")), ValueType::Dynamic);
    }
}
