//! Collector loop and finaliser.
//!
//! Drains the results queue one `DimensionResult` at a time, writes it
//! into that task's partial-result hash, and finalises the task once all
//! five dimensions have reported — regardless of whether any individual
//! dimension errored.

use super::weights::aggregate;
use super::MasterOrchestrator;
use crate::broker::pop_head_blocking;
use crate::constants::{partial_results_key, RESULTS_QUEUE};
use crate::models::{Dimension, DimensionResult, Evaluation, RecordStatus};
use crate::OrchestratorError;
use std::collections::HashMap;
use tracing::{debug, error, warn};

impl MasterOrchestrator {
    pub(crate) async fn collector_loop(&self) -> crate::Result<()> {
        loop {
            let popped = pop_head_blocking(
                self.broker.as_ref(),
                RESULTS_QUEUE,
                self.scheduling.results_pop_timeout,
            )
            .await;

            match popped {
                Ok(Some(payload)) => self.collect_one(payload).await,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "failed to pop results queue");
                    continue;
                }
            }
        }
    }

    pub(crate) async fn collect_one(&self, payload: String) {
        let result: DimensionResult = match serde_json::from_str(&payload) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "dropping unparseable dimension result");
                return;
            }
        };

        let key = partial_results_key(&result.task_id);
        let field = result.dimension.as_str();
        let value = match serde_json::to_string(&result) {
            Ok(v) => v,
            Err(e) => {
                error!(task_id = %result.task_id, error = %e, "failed to serialise dimension result");
                return;
            }
        };

        if let Err(e) = self.broker.hash_set(&key, field, value).await {
            error!(task_id = %result.task_id, error = %e, "failed to write partial result");
            return;
        }
        if let Err(e) = self
            .broker
            .expire(&key, self.scheduling.partial_results_ttl)
            .await
        {
            warn!(task_id = %result.task_id, error = %e, "failed to set partial result ttl");
        }

        let count = match self.broker.hash_len(&key).await {
            Ok(n) => n,
            Err(e) => {
                error!(task_id = %result.task_id, error = %e, "failed to read partial result count");
                return;
            }
        };

        if count < crate::models::ALL_DIMENSIONS.len() {
            debug!(task_id = %result.task_id, count, "waiting on remaining dimensions");
            return;
        }

        self.finalize(&result.task_id, &key).await;
    }

    async fn finalize(&self, task_id: &str, partial_results_key: &str) {
        let fields = match self.broker.hash_get_all(partial_results_key).await {
            Ok(f) => f,
            Err(e) => {
                error!(task_id, error = %e, "failed to read partial results for finalisation");
                return;
            }
        };

        let mut results: HashMap<Dimension, DimensionResult> = HashMap::new();
        for (_, raw) in fields {
            match serde_json::from_str::<DimensionResult>(&raw) {
                Ok(result) => {
                    results.insert(result.dimension, result);
                }
                Err(e) => warn!(task_id, error = %e, "dropping unparseable partial result field"),
            }
        }

        let Some(sample) = results.values().next() else {
            error!(task_id, "no parseable results to finalise with, dropping");
            return;
        };
        let record_id = sample.record_id.clone();
        let batch_id = sample.batch_id.clone();
        let agent_id = sample.agent_id.clone();

        let outcome = aggregate(&results, &self.weights);

        let processing_time_ms = if let Some(entry) = self.inflight.remove(task_id).await {
            entry.started_at.elapsed().as_millis() as u64
        } else {
            results.values().map(|r| r.processing_time_ms).max().unwrap_or(0)
        };

        let evaluation = Evaluation {
            record_id: record_id.clone(),
            batch_id: batch_id.clone(),
            agent_id,
            scores: outcome.scores,
            final_score: outcome.final_score,
            processing_errors: outcome.processing_errors,
            processing_time_ms,
            processed_at: chrono::Utc::now(),
        };

        let final_status = if outcome.any_valid {
            RecordStatus::Completed
        } else {
            RecordStatus::Failed
        };

        match self.store.write_evaluation(evaluation).await {
            Ok(()) => {
                if let Err(e) = self.store.mark_record_status(&record_id, final_status).await {
                    warn!(record_id, error = %e, "failed to mark record status after finalisation");
                }
            }
            Err(OrchestratorError::EvaluationConflict { .. }) => {
                debug!(record_id, "evaluation already finalised, skipping duplicate write");
            }
            Err(e) => {
                error!(record_id, error = %e, "failed to persist evaluation, marking record failed and leaving partial results for diagnosis");
                if let Err(e) = self
                    .store
                    .mark_record_status(&record_id, RecordStatus::Failed)
                    .await
                {
                    warn!(record_id, error = %e, "failed to mark record failed after evaluation write error");
                }
                if let Err(e) = self.progress.refresh(&batch_id).await {
                    warn!(batch_id, error = %e, "failed to refresh batch progress after evaluation write error");
                }
                return;
            }
        }

        if let Err(e) = self.broker.del(partial_results_key).await {
            warn!(task_id, error = %e, "failed to clean up partial results hash");
        }

        if let Err(e) = self.progress.refresh(&batch_id).await {
            warn!(batch_id, error = %e, "failed to refresh batch progress after finalisation");
        }
    }
}
