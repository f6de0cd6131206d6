use thiserror::Error;

/// Convenience type alias for Results with OrchestratorError
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Main error type for the evaluation orchestrator.
///
/// This enum represents all possible errors that can occur within the
/// scheduling and aggregation engine, providing detailed error context
/// for debugging and error handling. Each variant's recovery policy is
/// implemented by its caller (dispatch, collector, sweeper, or facade).
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("queue broker error: {0}")]
    Queue(String),

    #[error("store error: {message}")]
    Store { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("task {task_id} timed out after {elapsed_secs}s")]
    Timeout { task_id: String, elapsed_secs: u64 },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("retry budget exhausted for record {record_id}")]
    RetryExhausted { record_id: String },

    #[error("evaluation already exists for record {record_id}")]
    EvaluationConflict { record_id: String },

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn store(message: impl Into<String>) -> Self {
        OrchestratorError::Store {
            message: message.into(),
        }
    }
}
