use serde::{Serialize, Serializer};

use crate::expr::TraverseStep;
use crate::TfxrefError;

// ── Source Locations ────────────────────────────────────────────────────────

/// A position in a source file. Line and column are 1-based, byte is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

/// A half-open span in a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: SourcePos,
    pub end: SourcePos,
}

impl SourceRange {
    pub fn new(filename: impl Into<String>, start: SourcePos, end: SourcePos) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }

    /// A range on one line, `len` columns wide. Byte offsets mirror columns,
    /// which is only accurate for single-line ASCII sources such as test fixtures.
    pub fn single_line(filename: impl Into<String>, line: usize, column: usize, len: usize) -> Self {
        Self {
            filename: filename.into(),
            start: SourcePos {
                line,
                column,
                byte: column.saturating_sub(1),
            },
            end: SourcePos {
                line,
                column: column + len,
                byte: column.saturating_sub(1) + len,
            },
        }
    }

    /// Range covering `self` through the end of `other`.
    pub fn to(&self, other: &SourceRange) -> SourceRange {
        SourceRange {
            filename: self.filename.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start.line == self.end.line {
            write!(
                f,
                "{}:{},{}-{}",
                self.filename, self.start.line, self.start.column, self.end.column
            )
        } else {
            write!(
                f,
                "{}:{},{}-{},{}",
                self.filename, self.start.line, self.start.column, self.end.line, self.end.column
            )
        }
    }
}

// ── Module Identity ─────────────────────────────────────────────────────────

/// Stable identity of one module instantiation within a run.
///
/// The root module always carries [`ModuleIdentity::ROOT`]. Nested modules
/// combine the source address they were called with and the full call path,
/// so the same reusable module called from two places gets two identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleIdentity(String);

impl ModuleIdentity {
    pub const ROOT: &'static str = "<root>";

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Identity of a nested module. `path` must be non-empty.
    pub fn nested(source_address: &str, path: &[String]) -> Self {
        let call_path = path
            .iter()
            .map(|step| format!("module.{step}"))
            .collect::<Vec<_>>()
            .join(".");
        Self(format!("{source_address}::{call_path}"))
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Providers & Resources ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    Managed,
    Data,
}

impl std::fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managed => write!(f, "managed"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Fully qualified provider source address, e.g. `registry.terraform.io/hashicorp/aws`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderAddr {
    pub hostname: String,
    pub namespace: String,
    pub type_name: String,
}

impl ProviderAddr {
    pub const DEFAULT_HOSTNAME: &'static str = "registry.terraform.io";
    pub const DEFAULT_NAMESPACE: &'static str = "hashicorp";

    /// Address assumed for a provider local name with no `required_providers` entry.
    pub fn implied(local_name: &str) -> Self {
        Self {
            hostname: Self::DEFAULT_HOSTNAME.to_string(),
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            type_name: local_name.to_string(),
        }
    }
}

impl std::str::FromStr for ProviderAddr {
    type Err = TfxrefError;

    /// Accepts `type`, `namespace/type` and `hostname/namespace/type`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(TfxrefError::Parse(format!("invalid provider address: {s:?}")));
        }
        let lower = |p: &str| p.to_ascii_lowercase();
        match parts.as_slice() {
            [ty] => Ok(Self::implied(&lower(ty))),
            [ns, ty] => Ok(Self {
                hostname: Self::DEFAULT_HOSTNAME.to_string(),
                namespace: lower(ns),
                type_name: lower(ty),
            }),
            [host, ns, ty] => Ok(Self {
                hostname: lower(host),
                namespace: lower(ns),
                type_name: lower(ty),
            }),
            _ => Err(TfxrefError::Parse(format!("invalid provider address: {s:?}"))),
        }
    }
}

impl std::fmt::Display for ProviderAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

impl Serialize for ProviderAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Subjects & References ───────────────────────────────────────────────────

/// The symbol a reference resolves to, scoped to the referencing module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    InputVariable { name: String },
    LocalValue { name: String },
    ModuleCall { call: String },
    ModuleCallOutput { call: String, name: String },
    Resource {
        mode: ResourceMode,
        type_name: String,
        name: String,
    },
    CountAttr { name: String },
    ForEachAttr { name: String },
    PathAttr { name: String },
    TerraformAttr { name: String },
    SelfRef,
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputVariable { name } => write!(f, "var.{name}"),
            Self::LocalValue { name } => write!(f, "local.{name}"),
            Self::ModuleCall { call } => write!(f, "module.{call}"),
            Self::ModuleCallOutput { call, name } => write!(f, "module.{call}.output.{name}"),
            Self::Resource {
                mode: ResourceMode::Managed,
                type_name,
                name,
            } => write!(f, "{type_name}.{name}"),
            Self::Resource {
                mode: ResourceMode::Data,
                type_name,
                name,
            } => write!(f, "data.{type_name}.{name}"),
            Self::CountAttr { name } => write!(f, "count.{name}"),
            Self::ForEachAttr { name } => write!(f, "each.{name}"),
            Self::PathAttr { name } => write!(f, "path.{name}"),
            Self::TerraformAttr { name } => write!(f, "terraform.{name}"),
            Self::SelfRef => write!(f, "self"),
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A symbol read found in an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub subject: Subject,
    /// Range of the whole traversal, root through last step.
    pub range: SourceRange,
    /// Steps past the part of the traversal that names the subject.
    pub remaining: Vec<TraverseStep>,
}

/// The construct a reference was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Referrer {
    Local { name: String },
    Output { name: String },
    ModuleCall { name: String },
    Resource {
        mode: ResourceMode,
        type_name: String,
        name: String,
    },
}

impl std::fmt::Display for Referrer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { name } => write!(f, "local.{name}"),
            Self::Output { name } => write!(f, "output.{name}"),
            Self::ModuleCall { name } => write!(f, "module.{name}"),
            Self::Resource {
                mode: ResourceMode::Managed,
                type_name,
                name,
            } => write!(f, "{type_name}.{name}"),
            Self::Resource {
                mode: ResourceMode::Data,
                type_name,
                name,
            } => write!(f, "data.{type_name}.{name}"),
        }
    }
}

impl Serialize for Referrer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Facts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Variable,
    Local,
    Output,
    Resource,
    DataResource,
    ModuleCall,
}

impl DefinitionKind {
    /// Whether declarations of this kind carry expressions that read other symbols.
    pub fn has_references(self) -> bool {
        !matches!(self, Self::Variable)
    }
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Local => write!(f, "local"),
            Self::Output => write!(f, "output"),
            Self::Resource => write!(f, "resource"),
            Self::DataResource => write!(f, "data"),
            Self::ModuleCall => write!(f, "module"),
        }
    }
}

/// Extra detail attached to variable definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDetail {
    pub required: bool,
    pub value_type: String,
}

/// One record of the emitted fact stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum Fact {
    ModuleIdentity {
        identity: ModuleIdentity,
    },
    Definition {
        module: ModuleIdentity,
        kind: DefinitionKind,
        name: String,
        range: SourceRange,
        #[serde(skip_serializing_if = "Option::is_none")]
        variable: Option<VariableDetail>,
    },
    Reference {
        module: ModuleIdentity,
        from: Referrer,
        subject: Subject,
        range: SourceRange,
        remaining: Vec<TraverseStep>,
    },
}

// ── Diagnostics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The module tree violates an upstream invariant (missing call, missing child).
    Structural,
    /// A body does not match the schema used to read it.
    SchemaMismatch,
    /// No schema is registered for a resource type.
    SchemaNotFound,
    /// A traversal cannot be interpreted as a reference.
    InvalidReference,
    /// The source file could not be parsed cleanly.
    Syntax,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::SchemaMismatch => write!(f, "schema_mismatch"),
            Self::SchemaNotFound => write!(f, "schema_not_found"),
            Self::InvalidReference => write!(f, "invalid_reference"),
            Self::Syntax => write!(f, "syntax"),
        }
    }
}

/// A recoverable problem found while loading or indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub summary: String,
    pub detail: String,
    pub subject: Option<SourceRange>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, range: SourceRange) -> Self {
        self.subject = Some(range);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(range) = &self.subject {
            write!(f, " ({range})")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics accumulated during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.0.extend(other);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
