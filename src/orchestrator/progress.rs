//! Batch progress projection.
//!
//! Re-derives a batch's status and counters from the authoritative
//! per-record statuses in the store, then writes a cached snapshot into
//! the broker for cheap external polling. Runs after every event that can
//! move a record's status: dispatch, finalisation, and sweep.

use crate::broker::QueueBroker;
use crate::constants::{self, batch_progress_key};
use crate::models::{BatchProgress, BatchStatus};
use crate::store::Store;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct BatchProgressProjector {
    broker: Arc<dyn QueueBroker>,
    store: Arc<dyn Store>,
}

impl BatchProgressProjector {
    pub fn new(broker: Arc<dyn QueueBroker>, store: Arc<dyn Store>) -> Self {
        Self { broker, store }
    }

    /// Recomputes and republishes the progress snapshot for `batch_id`.
    /// A batch already `paused` or `cancelled` keeps that status — those
    /// are set explicitly via the enqueue facade and aren't derived from
    /// record counts. Otherwise the batch is `completed` once nothing is
    /// pending or processing, and `processing` while anything remains.
    pub async fn refresh(&self, batch_id: &str) -> Result<BatchProgress> {
        let counters = self.store.get_batch_progress(batch_id).await?;
        let current = self.store.get_batch_status(batch_id).await?;

        let status = match current {
            Some(BatchStatus::Paused) | Some(BatchStatus::Cancelled) => current.unwrap(),
            _ if counters.pending == 0 && counters.processing == 0 && counters.total > 0 => {
                BatchStatus::Completed
            }
            _ => BatchStatus::Processing,
        };

        self.store.set_batch_status(batch_id, status).await?;

        let snapshot = BatchProgress {
            batch_id: batch_id.to_string(),
            status,
            counters,
        };

        self.broker
            .set_ex(
                &batch_progress_key(batch_id),
                serde_json::to_string(&snapshot)?,
                Duration::from_secs(constants::BATCH_PROGRESS_TTL_SECS),
            )
            .await?;

        debug!(batch_id, ?status, ?counters, "batch progress refreshed");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use crate::models::{Record, RecordStatus};
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn batch_completes_once_nothing_is_pending_or_processing() {
        let broker = InMemoryBroker::shared();
        let store = Arc::new(InMemoryStore::new());
        let projector = BatchProgressProjector::new(broker, store.clone());

        let mut record = Record::new("b1", "a1", "p", "r");
        record.status = RecordStatus::Completed;
        store.put_record(record).await.unwrap();

        let snapshot = projector.refresh("b1").await.unwrap();
        assert_eq!(snapshot.status, BatchStatus::Completed);
    }

    #[tokio::test]
    async fn batch_stays_processing_while_records_remain_pending() {
        let broker = InMemoryBroker::shared();
        let store = Arc::new(InMemoryStore::new());
        let projector = BatchProgressProjector::new(broker, store.clone());

        store
            .put_record(Record::new("b1", "a1", "p", "r"))
            .await
            .unwrap();

        let snapshot = projector.refresh("b1").await.unwrap();
        assert_eq!(snapshot.status, BatchStatus::Processing);
    }

    #[tokio::test]
    async fn paused_status_is_not_overridden_by_record_counts() {
        let broker = InMemoryBroker::shared();
        let store = Arc::new(InMemoryStore::new());
        store.set_batch_status("b1", BatchStatus::Paused).await.unwrap();
        let projector = BatchProgressProjector::new(broker, store.clone());

        let snapshot = projector.refresh("b1").await.unwrap();
        assert_eq!(snapshot.status, BatchStatus::Paused);
    }
}
