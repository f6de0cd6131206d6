//! Enqueue facade.
//!
//! The only entry point into the pipeline: everything the dispatch,
//! collector, and sweeper loops act on was put there by one of these
//! calls. Queue and store writes are retried a bounded number of times;
//! a record that still can't be persisted or queued is marked `failed`
//! rather than silently dropped.

use crate::broker::QueueBroker;
use crate::constants::MAIN_QUEUE;
use crate::models::{BatchStatus, Record, RecordStatus, Task};
use crate::orchestrator::progress::BatchProgressProjector;
use crate::store::Store;
use crate::{OrchestratorError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const ENQUEUE_MAX_ATTEMPTS: u32 = 3;

pub enum RequeueOutcome {
    Requeued { task_id: String },
    RetryExhausted,
}

pub struct EnqueueFacade {
    broker: Arc<dyn QueueBroker>,
    store: Arc<dyn Store>,
    progress: Arc<BatchProgressProjector>,
    max_retries: u32,
}

impl EnqueueFacade {
    pub fn new(
        broker: Arc<dyn QueueBroker>,
        store: Arc<dyn Store>,
        progress: Arc<BatchProgressProjector>,
        max_retries: u32,
    ) -> Self {
        Self {
            broker,
            store,
            progress,
            max_retries,
        }
    }

    /// Persists every record as `queued` and pushes a fresh `Task` for
    /// each onto the main queue. Per-record failures are independent: one
    /// record failing to queue doesn't stop the rest, but does mark the
    /// batch `failed` once every record has been attempted.
    pub async fn enqueue_batch(&self, batch_id: &str, records: Vec<Record>) -> Result<()> {
        let mut any_failed = false;

        for mut record in records {
            record.batch_id = batch_id.to_string();
            record.status = RecordStatus::Queued;

            let persisted = retry(ENQUEUE_MAX_ATTEMPTS, || {
                self.store.put_record(record.clone())
            })
            .await;

            if persisted.is_err() {
                warn!(record_id = %record.record_id, "failed to persist record, marking failed");
                any_failed = true;
                record.status = RecordStatus::Failed;
                let _ = self.store.put_record(record.clone()).await;
                continue;
            }

            let task = Task::from_record(&record);
            let payload = serde_json::to_string(&task)?;
            let pushed = retry(ENQUEUE_MAX_ATTEMPTS, || {
                self.broker.append(MAIN_QUEUE, payload.clone())
            })
            .await;

            if pushed.is_err() {
                warn!(record_id = %record.record_id, "failed to enqueue task, marking failed");
                any_failed = true;
                record.status = RecordStatus::Failed;
                let _ = self.store.put_record(record.clone()).await;
            }
        }

        if any_failed {
            self.store
                .set_batch_status(batch_id, BatchStatus::Failed)
                .await?;
        }

        self.progress.refresh(batch_id).await?;
        Ok(())
    }

    /// Re-dispatches a failed record as a fresh task, bumping
    /// `retry_count`. Returns `RetryExhausted` without mutating anything
    /// once `retry_count` has already reached `max_retries`.
    pub async fn requeue_failed(&self, record_id: &str) -> Result<RequeueOutcome> {
        let mut record = self
            .store
            .get_record(record_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(format!("record {record_id}")))?;

        if record.retry_count >= self.max_retries {
            return Ok(RequeueOutcome::RetryExhausted);
        }

        record.retry_count += 1;
        record.status = RecordStatus::Queued;
        self.store.put_record(record.clone()).await?;

        let task = Task::from_record(&record);
        let payload = serde_json::to_string(&task)?;
        self.broker.append(MAIN_QUEUE, payload).await?;

        self.progress.refresh(&record.batch_id).await?;
        Ok(RequeueOutcome::Requeued {
            task_id: task.task_id,
        })
    }

    /// Marks a batch `paused` (advisory only — in-flight tasks already
    /// dispatched still run to completion; only future dispatch decisions
    /// are expected to honour it).
    pub async fn pause(&self, batch_id: &str) -> Result<()> {
        self.store
            .set_batch_status(batch_id, BatchStatus::Paused)
            .await
    }

    pub async fn resume(&self, batch_id: &str) -> Result<()> {
        self.store
            .set_batch_status(batch_id, BatchStatus::Processing)
            .await?;
        self.progress.refresh(batch_id).await?;
        Ok(())
    }

    /// Cancels a batch: sets the batch status to `cancelled` and
    /// transitions every not-yet-`processing` record in it to `cancelled`.
    /// Records already `processing` are left alone — they finalise or
    /// time out on their own, same as any other in-flight task.
    pub async fn cancel_batch(&self, batch_id: &str) -> Result<()> {
        self.store
            .set_batch_status(batch_id, BatchStatus::Cancelled)
            .await?;

        for record in self.store.list_records_for_batch(batch_id).await? {
            if record.status == RecordStatus::Processing {
                continue;
            }
            if let Err(e) = self
                .store
                .mark_record_status(&record.record_id, RecordStatus::Cancelled)
                .await
            {
                warn!(record_id = %record.record_id, error = %e, "failed to cancel record");
            }
        }

        self.progress.refresh(batch_id).await?;
        Ok(())
    }
}

async fn retry<F, Fut>(attempts: u32, mut f: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut last_err = None;
    for attempt in 0..attempts {
        match f().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = Some(e);
                tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt + 1))).await;
            }
        }
    }
    Err(last_err.expect("attempts > 0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use crate::store::InMemoryStore;

    fn facade() -> (EnqueueFacade, Arc<InMemoryBroker>, Arc<InMemoryStore>) {
        let broker = InMemoryBroker::shared();
        let store = Arc::new(InMemoryStore::new());
        let progress = Arc::new(BatchProgressProjector::new(broker.clone(), store.clone()));
        let facade = EnqueueFacade::new(broker.clone(), store.clone(), progress, 3);
        (facade, broker, store)
    }

    #[tokio::test]
    async fn enqueue_batch_queues_every_record() {
        let (facade, broker, _store) = facade();
        let records = vec![
            Record::new("b1", "a1", "p1", "r1"),
            Record::new("b1", "a1", "p2", "r2"),
        ];
        facade.enqueue_batch("b1", records).await.unwrap();
        assert_eq!(broker.length(MAIN_QUEUE).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn requeue_failed_bumps_retry_count() {
        let (facade, broker, store) = facade();
        let mut record = Record::new("b1", "a1", "p", "r");
        record.status = RecordStatus::Failed;
        store.put_record(record.clone()).await.unwrap();

        let outcome = facade.requeue_failed(&record.record_id).await.unwrap();
        assert!(matches!(outcome, RequeueOutcome::Requeued { .. }));
        assert_eq!(broker.length(MAIN_QUEUE).await.unwrap(), 1);

        let reloaded = store.get_record(&record.record_id).await.unwrap().unwrap();
        assert_eq!(reloaded.retry_count, 1);
        assert_eq!(reloaded.status, RecordStatus::Queued);
    }

    #[tokio::test]
    async fn requeue_failed_reports_exhaustion_past_max_retries() {
        let (facade, _broker, store) = facade();
        let mut record = Record::new("b1", "a1", "p", "r");
        record.status = RecordStatus::Failed;
        record.retry_count = 3;
        store.put_record(record.clone()).await.unwrap();

        let outcome = facade.requeue_failed(&record.record_id).await.unwrap();
        assert!(matches!(outcome, RequeueOutcome::RetryExhausted));
    }
}
