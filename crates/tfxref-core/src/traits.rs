use std::sync::Arc;

use crate::{BlockSchema, Fact, ProviderAddr, ResourceMode, TfxrefError};

// ── Traits ──────────────────────────────────────────────────────────────────

/// Destination for emitted facts.
///
/// Each call hands over exactly one fact. Implementations shared between
/// worker threads must serialize writes internally so records never
/// interleave; this is the only synchronization point of an indexing run.
/// Facts are never retracted once emitted.
pub trait EmissionSink: Send + Sync {
    fn emit(&self, fact: Fact) -> Result<(), TfxrefError>;

    /// Flush any buffered output. Called once at the end of a run.
    fn flush(&self) -> Result<(), TfxrefError> {
        Ok(())
    }
}

/// Lookup of provider-supplied resource schemas.
///
/// Queries are synchronous and side-effect free. Absence is an ordinary
/// answer: the caller skips the resource and records a diagnostic.
pub trait SchemaRegistry: Send + Sync {
    fn schema_for(
        &self,
        provider: &ProviderAddr,
        mode: ResourceMode,
        resource_type: &str,
    ) -> Option<Arc<BlockSchema>>;
}

impl<T: EmissionSink + ?Sized> EmissionSink for Arc<T> {
    fn emit(&self, fact: Fact) -> Result<(), TfxrefError> {
        (**self).emit(fact)
    }

    fn flush(&self) -> Result<(), TfxrefError> {
        (**self).flush()
    }
}

impl<T: SchemaRegistry + ?Sized> SchemaRegistry for Arc<T> {
    fn schema_for(
        &self,
        provider: &ProviderAddr,
        mode: ResourceMode,
        resource_type: &str,
    ) -> Option<Arc<BlockSchema>> {
        (**self).schema_for(provider, mode, resource_type)
    }
}
