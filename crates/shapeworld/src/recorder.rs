//! Sinks for trial records.

use crate::error::RecordError;
use crate::record::TrialRecord;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// Receives every record a session produces, in order.
///
/// Recording is synchronous: a session hands the record over before it
/// re-enables selection.
#[cfg_attr(test, mockall::automock)]
pub trait EventRecorder {
    /// Appends one record.
    fn record(&mut self, record: &TrialRecord) -> Result<(), RecordError>;
}

/// In-memory recorder; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    records: Arc<Mutex<Vec<TrialRecord>>>,
}

impl MemoryRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<TrialRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        self.records
            .lock()
            .map_err(|_| RecordError::Sink("record buffer poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// Writes each record as one line of JSON.
#[derive(Debug)]
pub struct JsonLinesRecorder<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesRecorder<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of records written.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventRecorder for JsonLinesRecorder<W> {
    #[instrument(skip_all, fields(trial_type = %record.trial_type(), action_number = record.action_number()))]
    fn record(&mut self, record: &TrialRecord) -> Result<(), RecordError> {
        let line = serde_json::to_string(record).map_err(|e| RecordError::Encode(e.to_string()))?;
        writeln!(self.writer, "{}", line).map_err(|e| RecordError::Sink(e.to_string()))?;
        self.writer.flush().map_err(|e| RecordError::Sink(e.to_string()))?;
        self.written += 1;
        debug!(written = self.written, "Record written");
        Ok(())
    }
}
