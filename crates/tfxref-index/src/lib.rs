//! tfxref-index: Cross-reference indexing for Terraform module trees.
//!
//! Loads a tree of configuration modules, then walks it emitting module
//! identities, symbol definitions and definition-to-reference edges with
//! exact source ranges. References from module-call arguments are read
//! through a schema synthesized from the callee's variables and attributed
//! to the caller; resource bodies are read through provider schemas.
//!
//! # Architecture
//!
//! - **parser** — Tree-sitter HCL parsing into the owned syntax model
//! - **reference** — Traversal collection and Terraform reference addressing
//! - **extractor** — Reference extraction from expressions and schema-guided bodies
//! - **schema** — Synthetic argument schemas built from module variables
//! - **identity** — Module identity assignment and collision checks
//! - **indexer** — Main pipeline: per-module bursts, tree walk, vertex-parallel walk
//! - **loader** — Directory walking and declaration decoding into a module tree
//! - **manifest** — `.terraform/modules/modules.json` parsing
//! - **registry** — Provider schemas from `terraform providers schema -json`
//! - **sink** — JSON-lines and in-memory fact sinks

pub mod extractor;
mod hcl;
pub mod identity;
pub mod indexer;
pub mod loader;
pub mod manifest;
pub mod parser;
pub mod reference;
pub mod registry;
pub mod schema;
pub mod sink;

pub use extractor::{
    references_in_all_attributes, references_in_body, references_in_expr, ExtractOutcome,
};
pub use identity::{identity_of, identity_of_node, IdentityLedger};
pub use indexer::{
    module_vertices, Cancellation, IndexReport, IndexStats, Indexer, ModuleVertex, NodeState,
    VertexKind,
};
pub use loader::{LoadResult, ModuleLoader};
pub use manifest::{ManifestEntry, ModuleManifest};
pub use parser::{HclParser, ParsedFile};
pub use reference::{parse_reference, traversals_in};
pub use registry::ProviderSchemaRegistry;
pub use schema::synthetic_schema;
pub use sink::{JsonLinesSink, MemorySink};
