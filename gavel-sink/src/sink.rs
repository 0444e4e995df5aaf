//! The sink contract and the in-memory implementation.

use crate::error::SinkResult;
use async_trait::async_trait;
use gavel_core::ScoreRecord;
use std::sync::{Arc, Mutex};

/// An append-only store for evaluation outcomes.
///
/// Records arrive out of order from concurrent tasks; implementations must
/// serialize writes so each record lands atomically. Appends are durable as
/// soon as they return; a crash mid-run must not lose completed pairs.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &ScoreRecord) -> SinkResult<()>;
}

/// Shared handle used by concurrent evaluation tasks.
pub type SharedSink = Arc<dyn RecordSink>;

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    async fn append(&self, record: &ScoreRecord) -> SinkResult<()> {
        (**self).append(record).await
    }
}

/// Collects records in memory. Test use only; nothing is durable.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ScoreRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn records(&self) -> Vec<ScoreRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records appended.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether nothing was appended.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &ScoreRecord) -> SinkResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
