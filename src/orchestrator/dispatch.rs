//! Dispatch loop.
//!
//! Pops one `Task` off the main queue at a time, fans it out to all five
//! dimension queues, and registers it in the in-flight table. Never pops
//! past `MaxConcurrentTasks` in-flight tasks; never blocks the thread
//! while the queue is empty.

use super::MasterOrchestrator;
use crate::broker::pop_head_blocking;
use crate::constants::{self, MAIN_QUEUE};
use crate::models::{RecordStatus, Task};
use std::time::Duration;
use tracing::{debug, error, warn};

impl MasterOrchestrator {
    pub(crate) async fn dispatch_loop(&self) -> crate::Result<()> {
        loop {
            if self.is_shutting_down() {
                debug!("dispatch loop observed shutdown, no longer popping main queue");
                tokio::time::sleep(Duration::from_millis(
                    constants::MAIN_QUEUE_EMPTY_BACKOFF_MS,
                ))
                .await;
                continue;
            }

            if self.inflight.len().await >= self.scheduling.max_concurrent_tasks {
                tokio::time::sleep(Duration::from_millis(
                    constants::MAIN_QUEUE_EMPTY_BACKOFF_MS,
                ))
                .await;
                continue;
            }

            let popped = pop_head_blocking(
                self.broker.as_ref(),
                MAIN_QUEUE,
                self.scheduling.main_pop_timeout,
            )
            .await;
            match popped {
                Ok(Some(payload)) => self.dispatch_one(payload).await,
                Ok(None) => {
                    // pop_head_blocking already spent up to main_pop_timeout
                    // polling; loop straight back around with no busy spin.
                }
                Err(e) => {
                    error!(error = %e, "failed to pop main queue");
                    tokio::time::sleep(Duration::from_millis(
                        constants::MAIN_QUEUE_EMPTY_BACKOFF_MS,
                    ))
                    .await;
                }
            }
        }
    }

    pub(crate) async fn dispatch_one(&self, payload: String) {
        let task: Task = match serde_json::from_str(&payload) {
            Ok(task) => task,
            Err(e) => {
                error!(error = %e, "dropping unparseable task payload");
                return;
            }
        };

        if let Err(e) = self
            .store
            .mark_record_status(&task.record_id, RecordStatus::Processing)
            .await
        {
            warn!(task_id = %task.task_id, error = %e, "failed to mark record processing, treating attempt as failed");
            if let Err(e) = self
                .store
                .mark_record_status(&task.record_id, RecordStatus::Failed)
                .await
            {
                warn!(task_id = %task.task_id, error = %e, "failed to mark record failed after processing-mark failure");
            }
            if let Err(e) = self.progress.refresh(&task.batch_id).await {
                warn!(batch_id = %task.batch_id, error = %e, "failed to refresh batch progress after dropped task");
            }
            return;
        }

        self.inflight.insert(&task).await;

        let pushes = futures::future::join_all(crate::models::ALL_DIMENSIONS.iter().map(
            |&dimension| {
                let subtask = task.subtask(dimension);
                let queue = constants::dimension_queue_name(dimension);
                async move {
                    let payload = match serde_json::to_string(&subtask) {
                        Ok(p) => p,
                        Err(e) => {
                            return Err((dimension, e.to_string()));
                        }
                    };
                    self.broker
                        .append(&queue, payload)
                        .await
                        .map_err(|e| (dimension, e.to_string()))
                }
            },
        ))
        .await;

        for result in pushes {
            if let Err((dimension, message)) = result {
                error!(
                    task_id = %task.task_id,
                    %dimension,
                    error = %message,
                    "failed to enqueue dimension subtask"
                );
            }
        }

        debug!(task_id = %task.task_id, record_id = %task.record_id, "task dispatched to all dimension queues");
    }
}
