use super::Store;
use crate::models::{BatchCounters, BatchStatus, Evaluation, Record, RecordStatus};
use crate::{OrchestratorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory stand-in for the persistent store: plain `HashMap`s behind a
/// `tokio::sync::Mutex`, exposing the same repository-style
/// `Result`-returning methods a real database client would.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Record>>,
    evaluations: Mutex<HashMap<String, Evaluation>>,
    batch_status: Mutex<HashMap<String, BatchStatus>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn evaluation_for(&self, record_id: &str) -> Option<Evaluation> {
        self.evaluations.lock().await.get(record_id).cloned()
    }

    pub async fn evaluation_count(&self) -> usize {
        self.evaluations.lock().await.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn mark_record_status(&self, record_id: &str, status: RecordStatus) -> Result<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("record {record_id}")))?;
        if record.status.is_terminal() && record.status != status {
            debug!(record_id, ?status, current = ?record.status, "ignoring transition out of terminal status");
            return Ok(());
        }
        record.status = status;
        debug!(record_id, ?status, "record status updated");
        Ok(())
    }

    async fn write_evaluation(&self, evaluation: Evaluation) -> Result<()> {
        let mut evaluations = self.evaluations.lock().await;
        if evaluations.contains_key(&evaluation.record_id) {
            return Err(OrchestratorError::EvaluationConflict {
                record_id: evaluation.record_id,
            });
        }
        evaluations.insert(evaluation.record_id.clone(), evaluation);
        Ok(())
    }

    async fn get_batch_status(&self, batch_id: &str) -> Result<Option<BatchStatus>> {
        Ok(self.batch_status.lock().await.get(batch_id).copied())
    }

    async fn set_batch_status(&self, batch_id: &str, status: BatchStatus) -> Result<()> {
        self.batch_status
            .lock()
            .await
            .insert(batch_id.to_string(), status);
        Ok(())
    }

    async fn get_record(&self, record_id: &str) -> Result<Option<Record>> {
        Ok(self.records.lock().await.get(record_id).cloned())
    }

    async fn list_records_for_batch(&self, batch_id: &str) -> Result<Vec<Record>> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn get_batch_progress(&self, batch_id: &str) -> Result<BatchCounters> {
        let records = self.records.lock().await;
        let mut counters = BatchCounters::default();
        for record in records.values().filter(|r| r.batch_id == batch_id) {
            counters.total += 1;
            match record.status {
                RecordStatus::Pending | RecordStatus::Queued => counters.pending += 1,
                RecordStatus::Processing => counters.processing += 1,
                RecordStatus::Completed => counters.completed += 1,
                RecordStatus::Failed => counters.failed += 1,
                RecordStatus::Cancelled => counters.cancelled += 1,
            }
        }
        Ok(counters)
    }

    async fn put_record(&self, record: Record) -> Result<()> {
        self.records.lock().await.insert(record.record_id.clone(), record);
        Ok(())
    }
}
