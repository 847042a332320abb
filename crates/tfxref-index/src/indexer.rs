//! Main indexing pipeline orchestrator.
//!
//! Walks a [`ModuleTree`] and streams identity, definition and reference facts
//! to an [`EmissionSink`]. Every module is handled by one uninterrupted burst:
//!
//! 1. emit the module identity,
//! 2. emit definitions for its variables, locals, outputs, resources and calls,
//! 3. emit references from locals and outputs,
//! 4. emit references from each module call's arguments, read through a
//!    schema synthesized from the callee's variables and attributed to the
//!    caller,
//! 5. emit references from each resource body, read through the registry schema.
//!
//! The tree walk then descends into the children in call order. The same
//! burst drives the vertex form, where expand/close vertices are pulled from
//! a queue by worker threads with no ordering between modules.

use crate::extractor::{
    references_in_all_attributes, references_in_body, references_in_expr, ExtractOutcome,
};
use crate::identity::{identity_of, identity_of_node, IdentityLedger};
use crate::schema::synthetic_schema;
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tfxref_core::{
    DefinitionKind, Diagnostic, DiagnosticKind, Diagnostics, EmissionSink, Expr, Fact,
    IndexConfig, ModuleId, ModuleIdentity, ModuleNode, ModuleTree, Referrer, ResourceMode,
    SchemaRegistry, SourceRange, TfxrefError, VariableDetail,
};

// ── Run State ───────────────────────────────────────────────────────────────

/// Cooperative cancellation flag, checked before each module burst.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress of one module through its burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeState {
    Entering,
    IdentityEmitted,
    DefinitionsEmitted,
    ReferencesEmitted,
    ChildrenWalked,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub modules: usize,
    pub definitions: usize,
    pub references: usize,
    pub resources_skipped: usize,
}

impl IndexStats {
    fn absorb(&mut self, other: &IndexStats) {
        self.modules += other.modules;
        self.definitions += other.definitions;
        self.references += other.references;
        self.resources_skipped += other.resources_skipped;
    }
}

/// Everything a run reports besides the facts it emitted.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub diagnostics: Diagnostics,
    pub stats: IndexStats,
    /// The run stopped early because its [`Cancellation`] fired.
    pub cancelled: bool,
    states: HashMap<ModuleId, NodeState>,
}

impl IndexReport {
    /// Last state reached by a module; `None` if it was never entered.
    pub fn state_of(&self, id: ModuleId) -> Option<NodeState> {
        self.states.get(&id).copied()
    }

    fn absorb(&mut self, outcome: NodeOutcome) {
        self.diagnostics.extend(outcome.diagnostics);
        self.stats.absorb(&outcome.stats);
    }
}

/// Diagnostics and counters produced by one burst.
#[derive(Debug, Default)]
struct NodeOutcome {
    diagnostics: Diagnostics,
    stats: IndexStats,
}

impl NodeOutcome {
    fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn record_all(&mut self, diagnostics: Diagnostics) {
        for diagnostic in diagnostics {
            self.record(diagnostic);
        }
    }
}

/// Shared bookkeeping of one run: identities handed out and node states.
#[derive(Default)]
struct Run {
    ledger: IdentityLedger,
    states: Mutex<HashMap<ModuleId, NodeState>>,
}

impl Run {
    /// Mark `id` as entered. False if it was entered before.
    fn enter(&self, id: ModuleId) -> Result<bool, TfxrefError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?;
        if states.contains_key(&id) {
            return Ok(false);
        }
        states.insert(id, NodeState::Entering);
        tracing::trace!("{id}: Entering");
        Ok(true)
    }

    fn advance(&self, id: ModuleId, state: NodeState) -> Result<(), TfxrefError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?;
        tracing::trace!("{id}: {:?}", state);
        states.insert(id, state);
        Ok(())
    }

    fn into_states(self) -> Result<HashMap<ModuleId, NodeState>, TfxrefError> {
        self.states
            .into_inner()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))
    }
}

// ── Vertices ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Emits the module's facts.
    Expand,
    /// Marks the end of the module. Carries no facts.
    Close,
}

/// One module vertex of a linearized module graph.
///
/// Vertices carry their own copy of the module address, as a graph builder
/// would; the indexer checks it against the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVertex {
    pub module: ModuleId,
    pub kind: VertexKind,
    pub path: Vec<String>,
    pub source_address: Option<String>,
}

/// An expand and a close vertex for every module, in tree order.
pub fn module_vertices(tree: &ModuleTree) -> Vec<ModuleVertex> {
    tree.iter()
        .flat_map(|node| {
            [VertexKind::Expand, VertexKind::Close].map(|kind| ModuleVertex {
                module: node.id(),
                kind,
                path: node.path().to_vec(),
                source_address: node.source_address.clone(),
            })
        })
        .collect()
}

// ── Indexer ─────────────────────────────────────────────────────────────────

/// The main indexing pipeline.
pub struct Indexer<'a> {
    sink: &'a dyn EmissionSink,
    registry: &'a dyn SchemaRegistry,
    config: IndexConfig,
    cancellation: Cancellation,
}

impl<'a> Indexer<'a> {
    pub fn new(sink: &'a dyn EmissionSink, registry: &'a dyn SchemaRegistry) -> Self {
        Self {
            sink,
            registry,
            config: IndexConfig::default(),
            cancellation: Cancellation::new(),
        }
    }

    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Index `tree` with the configured strategy.
    pub fn run(&self, tree: &ModuleTree) -> Result<IndexReport, TfxrefError> {
        let report = if self.config.workers == 0 {
            self.index_tree(tree)?
        } else {
            self.index_parallel(tree, self.config.workers)?
        };
        self.sink.flush()?;
        tracing::info!(
            "Indexed {} modules: {} definitions, {} references, {} diagnostics{}",
            report.stats.modules,
            report.stats.definitions,
            report.stats.references,
            report.diagnostics.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }

    /// Depth-first walk from the root on the calling thread.
    pub fn index_tree(&self, tree: &ModuleTree) -> Result<IndexReport, TfxrefError> {
        let run = Run::default();
        let mut report = IndexReport::default();
        self.walk(tree, tree.root(), &run, &mut report)?;
        report.states = run.into_states()?;
        Ok(report)
    }

    fn walk(
        &self,
        tree: &ModuleTree,
        id: ModuleId,
        run: &Run,
        report: &mut IndexReport,
    ) -> Result<(), TfxrefError> {
        if self.cancellation.is_cancelled() {
            tracing::debug!("Cancelled before {id}");
            report.cancelled = true;
            return Ok(());
        }
        let outcome = self.expand(tree, id, run)?;
        report.absorb(outcome);

        for child in child_order(tree, id) {
            self.walk(tree, child, run, report)?;
            if report.cancelled {
                return Ok(());
            }
        }
        run.advance(id, NodeState::ChildrenWalked)
    }

    /// Visit every module vertex of `tree` on `workers` threads.
    pub fn index_parallel(
        &self,
        tree: &ModuleTree,
        workers: usize,
    ) -> Result<IndexReport, TfxrefError> {
        self.index_vertices(tree, &module_vertices(tree), workers)
    }

    /// Visit externally supplied vertices on `workers` threads.
    ///
    /// Vertices are independent: any number run at once and facts of
    /// different modules may interleave in the sink. Diagnostics are merged
    /// in vertex order.
    pub fn index_vertices(
        &self,
        tree: &ModuleTree,
        vertices: &[ModuleVertex],
        workers: usize,
    ) -> Result<IndexReport, TfxrefError> {
        let (tx, rx) = crossbeam_channel::unbounded::<(usize, &ModuleVertex)>();
        for item in vertices.iter().enumerate() {
            tx.send(item)
                .map_err(|e| TfxrefError::Sink(format!("vertex queue closed: {e}")))?;
        }
        drop(tx);

        let run = Run::default();
        let abort = AtomicBool::new(false);
        let workers = workers.max(1);
        tracing::debug!("Visiting {} vertices on {} workers", vertices.len(), workers);

        let results: Vec<Result<WorkerOutput, TfxrefError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let rx = rx.clone();
                    let run = &run;
                    let abort = &abort;
                    s.spawn(move || self.vertex_worker(tree, rx, run, abort))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join().unwrap_or_else(|_| {
                        Err(TfxrefError::LockPoisoned("indexer worker panicked".to_string()))
                    })
                })
                .collect()
        });

        let mut report = IndexReport::default();
        let mut outcomes = Vec::new();
        for result in results {
            let output = result?;
            report.cancelled |= output.cancelled;
            outcomes.extend(output.outcomes);
        }
        outcomes.sort_by_key(|(index, _)| *index);
        for (_, outcome) in outcomes {
            report.absorb(outcome);
        }
        report.states = run.into_states()?;
        Ok(report)
    }

    fn vertex_worker(
        &self,
        tree: &ModuleTree,
        rx: Receiver<(usize, &ModuleVertex)>,
        run: &Run,
        abort: &AtomicBool,
    ) -> Result<WorkerOutput, TfxrefError> {
        let mut output = WorkerOutput::default();
        for (index, vertex) in rx.iter() {
            if abort.load(Ordering::SeqCst) {
                break;
            }
            if self.cancellation.is_cancelled() {
                output.cancelled = true;
                break;
            }
            let result = match vertex.kind {
                VertexKind::Expand => self.expand(tree, vertex.module, run).and_then(|o| {
                    run.advance(vertex.module, NodeState::ChildrenWalked)?;
                    Ok(o)
                }),
                VertexKind::Close => self.close(vertex, run).map(|_| NodeOutcome::default()),
            };
            match result {
                Ok(outcome) => output.outcomes.push((index, outcome)),
                Err(err) => {
                    abort.store(true, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }
        Ok(output)
    }

    /// A close vertex only has to agree with the identity of its module.
    fn close(&self, vertex: &ModuleVertex, run: &Run) -> Result<(), TfxrefError> {
        let identity = identity_of(&vertex.path, vertex.source_address.as_deref())?;
        run.ledger.record(vertex.module, &identity)?;
        tracing::trace!("{}: closed as {}", vertex.module, identity);
        Ok(())
    }

    /// Steps 1 to 5 for one module. Children are not visited.
    fn expand(&self, tree: &ModuleTree, id: ModuleId, run: &Run) -> Result<NodeOutcome, TfxrefError> {
        let mut outcome = NodeOutcome::default();
        let node = tree
            .get(id)
            .ok_or_else(|| TfxrefError::NotFound(format!("module node {id}")))?;

        if !run.enter(id)? {
            outcome.record(Diagnostic::error(
                DiagnosticKind::Structural,
                "Module visited twice",
                format!("{id} was already indexed in this run; skipping"),
            ));
            return Ok(outcome);
        }

        // 1. Identity.
        let identity = identity_of_node(tree, id)?;
        run.ledger.record(id, &identity)?;
        tracing::debug!("Indexing {} ({})", identity, id);
        self.sink.emit(Fact::ModuleIdentity {
            identity: identity.clone(),
        })?;
        outcome.stats.modules += 1;
        run.advance(id, NodeState::IdentityEmitted)?;

        // 2. Definitions.
        self.emit_definitions(node, &identity, &mut outcome)?;
        run.advance(id, NodeState::DefinitionsEmitted)?;

        // 3 to 5. References.
        self.emit_value_references(node, &identity, &mut outcome)?;
        self.emit_call_references(tree, node, &identity, &mut outcome)?;
        self.emit_resource_references(node, &identity, &mut outcome)?;
        run.advance(id, NodeState::ReferencesEmitted)?;

        for (key, _) in node.children() {
            if node.module.module_call(key).is_none() {
                outcome.record(Diagnostic::error(
                    DiagnosticKind::Structural,
                    "Module call block not found",
                    format!("{identity} has a child module {key:?} without a matching module block"),
                ));
            }
        }
        Ok(outcome)
    }

    fn emit_definitions(
        &self,
        node: &ModuleNode,
        identity: &ModuleIdentity,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        let module = &node.module;
        for variable in &module.variables {
            let detail = VariableDetail {
                required: variable.is_required(),
                value_type: variable
                    .value_type
                    .as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "any".to_string()),
            };
            self.definition(
                identity,
                DefinitionKind::Variable,
                &variable.name,
                &variable.range,
                Some(detail),
                outcome,
            )?;
        }
        for local in &module.locals {
            self.definition(identity, DefinitionKind::Local, &local.name, &local.range, None, outcome)?;
        }
        for output in &module.outputs {
            self.definition(identity, DefinitionKind::Output, &output.name, &output.range, None, outcome)?;
        }
        for resource in &module.resources {
            let kind = match resource.mode {
                ResourceMode::Managed => DefinitionKind::Resource,
                ResourceMode::Data => DefinitionKind::DataResource,
            };
            self.definition(identity, kind, &resource.address(), &resource.range, None, outcome)?;
        }
        for call in &module.module_calls {
            self.definition(identity, DefinitionKind::ModuleCall, &call.name, &call.range, None, outcome)?;
        }
        Ok(())
    }

    fn definition(
        &self,
        identity: &ModuleIdentity,
        kind: DefinitionKind,
        name: &str,
        range: &SourceRange,
        variable: Option<VariableDetail>,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        self.sink.emit(Fact::Definition {
            module: identity.clone(),
            kind,
            name: name.to_string(),
            range: range.clone(),
            variable,
        })?;
        outcome.stats.definitions += 1;
        Ok(())
    }

    /// Step 3: locals and outputs, one expression each.
    fn emit_value_references(
        &self,
        node: &ModuleNode,
        identity: &ModuleIdentity,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        for local in &node.module.locals {
            let from = Referrer::Local {
                name: local.name.clone(),
            };
            self.references(identity, &from, references_in_expr(&local.expr), outcome)?;
        }
        for output in &node.module.outputs {
            let from = Referrer::Output {
                name: output.name.clone(),
            };
            self.references(identity, &from, references_in_expr(&output.expr), outcome)?;
        }
        Ok(())
    }

    /// Step 4: module-call arguments. The expressions live in the caller, so
    /// the references belong to `identity`, not to the callee.
    fn emit_call_references(
        &self,
        tree: &ModuleTree,
        node: &ModuleNode,
        identity: &ModuleIdentity,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        for call in &node.module.module_calls {
            let from = call.referrer();
            let callee = node.children().get(&call.name).and_then(|c| tree.get(*c));

            let extracted = match callee {
                Some(callee) => match synthetic_schema(&callee.module.variables) {
                    Ok(schema) => references_in_body(&call.config, &schema),
                    Err(err) => {
                        outcome.record(
                            Diagnostic::error(
                                DiagnosticKind::Structural,
                                "Invalid module interface",
                                format!("module.{}: {err}", call.name),
                            )
                            .with_subject(call.range.clone()),
                        );
                        ExtractOutcome::default()
                    }
                },
                None => {
                    outcome.record(
                        Diagnostic::warning(
                            DiagnosticKind::Structural,
                            "Module not loaded",
                            format!(
                                "module.{} has no loaded module; arguments are read without a schema",
                                call.name
                            ),
                        )
                        .with_subject(call.range.clone()),
                    );
                    references_in_all_attributes(&call.config)
                }
            };
            self.references(identity, &from, extracted, outcome)?;
            self.meta_references(identity, &from, &call.count, &call.for_each, &call.depends_on, outcome)?;
        }
        Ok(())
    }

    /// Step 5: resource bodies through registry schemas.
    fn emit_resource_references(
        &self,
        node: &ModuleNode,
        identity: &ModuleIdentity,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        let module = &node.module;
        for resource in &module.resources {
            let provider = module.provider_for(resource);
            let Some(schema) = self
                .registry
                .schema_for(&provider, resource.mode, &resource.type_name)
            else {
                outcome.record(
                    Diagnostic::error(
                        DiagnosticKind::SchemaNotFound,
                        "Resource schema not found",
                        format!(
                            "{} in {identity}: provider {provider} has no {} schema for {:?}",
                            resource.address(),
                            resource.mode,
                            resource.type_name
                        ),
                    )
                    .with_subject(resource.range.clone()),
                );
                outcome.stats.resources_skipped += 1;
                continue;
            };

            let from = resource.referrer();
            self.references(identity, &from, references_in_body(&resource.config, &schema), outcome)?;
            self.meta_references(
                identity,
                &from,
                &resource.count,
                &resource.for_each,
                &resource.depends_on,
                outcome,
            )?;
        }
        Ok(())
    }

    fn meta_references(
        &self,
        identity: &ModuleIdentity,
        from: &Referrer,
        count: &Option<Expr>,
        for_each: &Option<Expr>,
        depends_on: &[Expr],
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        if !self.config.meta_arguments {
            return Ok(());
        }
        for expr in count.iter().chain(for_each.iter()).chain(depends_on.iter()) {
            self.references(identity, from, references_in_expr(expr), outcome)?;
        }
        Ok(())
    }

    fn references(
        &self,
        identity: &ModuleIdentity,
        from: &Referrer,
        extracted: ExtractOutcome,
        outcome: &mut NodeOutcome,
    ) -> Result<(), TfxrefError> {
        outcome.record_all(extracted.diagnostics);
        for reference in extracted.references {
            self.sink.emit(Fact::Reference {
                module: identity.clone(),
                from: from.clone(),
                subject: reference.subject,
                range: reference.range,
                remaining: reference.remaining,
            })?;
            outcome.stats.references += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
struct WorkerOutput {
    outcomes: Vec<(usize, NodeOutcome)>,
    cancelled: bool,
}

/// Children in module-call order, then any child without a call block.
fn child_order(tree: &ModuleTree, id: ModuleId) -> Vec<ModuleId> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let mut order: Vec<ModuleId> = node
        .module
        .module_calls
        .iter()
        .filter_map(|call| node.children().get(&call.name).copied())
        .collect();
    for child in node.children().values() {
        if !order.contains(child) {
            order.push(*child);
        }
    }
    order
}
