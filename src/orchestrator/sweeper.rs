//! Timeout sweeper.
//!
//! Periodically scans the in-flight table for tasks that have been
//! outstanding longer than `TaskTimeout` and fails them. A task can be
//! swept even if some of its dimension results already arrived — the
//! collector and sweeper race on `InFlightTable::remove`, and whichever
//! gets there first wins; the loser is a no-op.

use super::MasterOrchestrator;
use crate::constants::partial_results_key;
use crate::models::RecordStatus;
use tracing::{info, warn};

impl MasterOrchestrator {
    pub(crate) async fn sweeper_loop(&self) -> crate::Result<()> {
        let mut ticker = tokio::time::interval(self.scheduling.sweep_interval);
        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    pub(crate) async fn sweep_once(&self) {
        let expired = self.inflight.sweep_expired(self.scheduling.task_timeout).await;
        if expired.is_empty() {
            return;
        }

        info!(count = expired.len(), "sweeping timed-out tasks");

        for entry in expired {
            if let Err(e) = self
                .store
                .mark_record_status(&entry.record_id, RecordStatus::Failed)
                .await
            {
                warn!(record_id = %entry.record_id, error = %e, "failed to mark timed-out record as failed");
            }

            if let Err(e) = self.broker.del(&partial_results_key(&entry.task_id)).await {
                warn!(task_id = %entry.task_id, error = %e, "failed to clean up partial results for timed-out task");
            }

            if let Err(e) = self.progress.refresh(&entry.batch_id).await {
                warn!(batch_id = %entry.batch_id, error = %e, "failed to refresh batch progress after sweep");
            }
        }
    }
}
