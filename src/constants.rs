//! System-wide defaults and queue/key naming for the evaluation orchestrator.
//! Env vars in `Config` override every default listed here.

// Queue / key names
pub const MAIN_QUEUE: &str = "main_evaluation_tasks";
pub const RESULTS_QUEUE: &str = "dimension_results";

pub fn dimension_queue_name(dimension: crate::models::Dimension) -> String {
    format!("dimension_queue:{}", dimension.as_str())
}

pub fn partial_results_key(task_id: &str) -> String {
    format!("task:{task_id}:results")
}

pub fn batch_progress_key(batch_id: &str) -> String {
    format!("batch:{batch_id}:progress")
}

pub fn worker_liveness_key(worker_id: &str) -> String {
    format!("worker:{worker_id}:status")
}

// Scheduling defaults
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 10;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_PARTIAL_RESULTS_TTL_SECS: u64 = 3600;
pub const DEFAULT_RESULTS_POP_TIMEOUT_SECS: u64 = 1;
pub const DEFAULT_MAIN_POP_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HARD_SHUTDOWN_DEADLINE_SECS: u64 = 30;

// Main-queue pop backoff when empty: non-blocking pop with a short backoff,
// no busy spinning.
pub const MAIN_QUEUE_EMPTY_BACKOFF_MS: u64 = 1000;

// Polling cadence used to simulate a blocking pop against the broker.
pub const BROKER_POLL_INTERVAL_MS: u64 = 100;

// Batch progress snapshot TTL.
pub const BATCH_PROGRESS_TTL_SECS: u64 = 86_400;

// Worker liveness TTL.
pub const WORKER_LIVENESS_TTL_SECS: u64 = 60;

// Default dimension weights, sum to 1.00.
pub const DEFAULT_WEIGHT_INSTRUCTION: f64 = 0.20;
pub const DEFAULT_WEIGHT_HALLUCINATION: f64 = 0.25;
pub const DEFAULT_WEIGHT_ASSUMPTION: f64 = 0.20;
pub const DEFAULT_WEIGHT_COHERENCE: f64 = 0.15;
pub const DEFAULT_WEIGHT_ACCURACY: f64 = 0.20;
