/// Unified error type for tfxref.
///
/// Only conditions that stop an operation outright are errors. Problems the
/// indexer can route around (schema mismatches, missing schemas, broken
/// module calls) are reported as [`crate::Diagnostic`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum TfxrefError {
    /// Module identities can no longer be trusted; the run must stop.
    #[error("Fatal identity error: {0}")]
    FatalIdentity(String),

    #[error("Duplicate schema attribute: {0}")]
    DuplicateAttribute(String),

    #[error("Duplicate module call: {0}")]
    DuplicateModuleCall(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TfxrefError {
    /// Whether this error must abort an indexing run rather than being
    /// folded into diagnostics.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FatalIdentity(_) | Self::Sink(_) | Self::LockPoisoned(_) | Self::Io(_)
        )
    }
}
