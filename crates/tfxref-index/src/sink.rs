//! Emission sinks.

use std::io::Write;
use std::sync::Mutex;
use tfxref_core::{EmissionSink, Fact, TfxrefError};

/// Writes one JSON object per line.
///
/// The mutex around the writer is held for exactly one record, so facts from
/// concurrent workers never interleave.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer in tests.
    pub fn into_inner(self) -> Result<W, TfxrefError> {
        self.writer
            .into_inner()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))
    }
}

impl<W: Write + Send> EmissionSink for JsonLinesSink<W> {
    fn emit(&self, fact: Fact) -> Result<(), TfxrefError> {
        let mut line = serde_json::to_string(&fact)?;
        line.push('\n');
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?;
        writer
            .write_all(line.as_bytes())
            .map_err(|e| TfxrefError::Sink(e.to_string()))
    }

    fn flush(&self) -> Result<(), TfxrefError> {
        self.writer
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?
            .flush()
            .map_err(|e| TfxrefError::Sink(e.to_string()))
    }
}

/// Keeps every fact in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    facts: Mutex<Vec<Fact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the facts emitted so far.
    pub fn facts(&self) -> Vec<Fact> {
        self.facts.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.facts.lock().map(|f| f.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EmissionSink for MemorySink {
    fn emit(&self, fact: Fact) -> Result<(), TfxrefError> {
        self.facts
            .lock()
            .map_err(|e| TfxrefError::LockPoisoned(e.to_string()))?
            .push(fact);
        Ok(())
    }
}
