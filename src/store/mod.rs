//! Persistent store boundary.
//!
//! The real store (records, evaluations, batch summaries) lives outside
//! the core. This trait is the seam; [`InMemoryStore`] backs every test
//! and lets the full dispatch→collect→finalise pipeline run without a
//! database.

mod in_memory;

pub use in_memory::InMemoryStore;

use crate::models::{BatchCounters, BatchStatus, Evaluation, Record, RecordStatus};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    async fn mark_record_status(&self, record_id: &str, status: RecordStatus) -> Result<()>;

    /// Fails with `OrchestratorError::EvaluationConflict` if an Evaluation
    /// already exists for `evaluation.record_id` — finalisation interprets
    /// that as "already finalised" rather than an error.
    async fn write_evaluation(&self, evaluation: Evaluation) -> Result<()>;

    async fn get_record(&self, record_id: &str) -> Result<Option<Record>>;

    /// Every record belonging to `batch_id`, in no particular order. Used
    /// by batch-wide operations (cancel) that need to touch each record
    /// individually rather than just the derived counters.
    async fn list_records_for_batch(&self, batch_id: &str) -> Result<Vec<Record>>;

    async fn get_batch_progress(&self, batch_id: &str) -> Result<BatchCounters>;

    /// Last batch status the progress projector computed, or `None` if
    /// the batch has never been projected.
    async fn get_batch_status(&self, batch_id: &str) -> Result<Option<BatchStatus>>;

    /// Advisory batch status, set by the enqueue facade (`pause`/`resume`)
    /// and the progress projector. Independent of any single record's
    /// status.
    async fn set_batch_status(&self, batch_id: &str, status: BatchStatus) -> Result<()>;

    /// Registers a freshly ingested record, used by the enqueue facade
    /// and by tests that seed a batch. Not part of the external store
    /// contract (which assumes records are already persisted by the
    /// uploader) but required by any in-memory double that has to play
    /// that uploader's role too.
    async fn put_record(&self, record: Record) -> Result<()>;
}
