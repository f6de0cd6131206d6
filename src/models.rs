use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use uuid::Uuid;

/// One of the five quality dimensions a response is scored on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Instruction,
    Hallucination,
    Assumption,
    Coherence,
    Accuracy,
}

pub const ALL_DIMENSIONS: [Dimension; 5] = [
    Dimension::Instruction,
    Dimension::Hallucination,
    Dimension::Assumption,
    Dimension::Coherence,
    Dimension::Accuracy,
];

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Instruction => "instruction",
            Dimension::Hallucination => "hallucination",
            Dimension::Assumption => "assumption",
            Dimension::Coherence => "coherence",
            Dimension::Accuracy => "accuracy",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instruction" => Ok(Dimension::Instruction),
            "hallucination" => Ok(Dimension::Hallucination),
            "assumption" => Ok(Dimension::Assumption),
            "coherence" => Ok(Dimension::Coherence),
            "accuracy" => Ok(Dimension::Accuracy),
            other => Err(format!("unknown dimension: {other}")),
        }
    }
}

/// Status of a Record as it moves through ingestion, dispatch, and
/// finalisation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RecordStatus {
    /// Once a record reaches one of these, it does not leave it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecordStatus::Completed | RecordStatus::Failed | RecordStatus::Cancelled
        )
    }
}

/// Status of a Batch. Distinct from `RecordStatus`: a batch can be
/// `paused` or `cancelled` independent of any individual record's state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Processing,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// One prompt/response pair submitted for evaluation.
///
/// Payload fields are immutable once created; only `status` is mutated,
/// and only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub record_id: String,
    pub batch_id: String,
    pub agent_id: String,
    pub prompt: String,
    pub response_text: String,
    pub context: Option<String>,
    pub reference: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub status: RecordStatus,
    pub retry_count: u32,
}

impl Record {
    pub fn new(
        batch_id: impl Into<String>,
        agent_id: impl Into<String>,
        prompt: impl Into<String>,
        response_text: impl Into<String>,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            batch_id: batch_id.into(),
            agent_id: agent_id.into(),
            prompt: prompt.into(),
            response_text: response_text.into(),
            context: None,
            reference: None,
            metadata: HashMap::new(),
            status: RecordStatus::Pending,
            retry_count: 0,
        }
    }
}

/// One attempt at scoring a Record. A retried record gets a fresh
/// `task_id`; the `record_id` stays the same. Serialised on the wire as
/// `response_id`, the name the dimension worker pools expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(rename = "response_id")]
    pub record_id: String,
    pub batch_id: String,
    pub agent_id: String,
    pub prompt: String,
    pub response_text: String,
    pub context: Option<String>,
    pub reference: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub dimensions: Vec<Dimension>,
    pub retry_count: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Task {
    pub fn from_record(record: &Record) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            record_id: record.record_id.clone(),
            batch_id: record.batch_id.clone(),
            agent_id: record.agent_id.clone(),
            prompt: record.prompt.clone(),
            response_text: record.response_text.clone(),
            context: record.context.clone(),
            reference: record.reference.clone(),
            metadata: record.metadata.clone(),
            dimensions: ALL_DIMENSIONS.to_vec(),
            retry_count: record.retry_count,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn subtask(&self, dimension: Dimension) -> DimensionSubtask {
        DimensionSubtask {
            task_id: self.task_id.clone(),
            record_id: self.record_id.clone(),
            batch_id: self.batch_id.clone(),
            agent_id: self.agent_id.clone(),
            prompt: self.prompt.clone(),
            response_text: self.response_text.clone(),
            context: self.context.clone(),
            reference: self.reference.clone(),
            metadata: self.metadata.clone(),
            dimensions: self.dimensions.clone(),
            dimension,
        }
    }
}

/// A per-dimension work item derived from a Task; consumed by one
/// dimension worker pool. Same envelope as `Task` plus the single
/// `dimension` this copy is scoped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionSubtask {
    pub task_id: String,
    #[serde(rename = "response_id")]
    pub record_id: String,
    pub batch_id: String,
    pub agent_id: String,
    pub prompt: String,
    pub response_text: String,
    pub context: Option<String>,
    pub reference: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub dimensions: Vec<Dimension>,
    pub dimension: Dimension,
}

/// The scored response to a DimensionSubtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionResult {
    pub task_id: String,
    pub dimension: Dimension,
    #[serde(rename = "response_id")]
    pub record_id: String,
    pub batch_id: String,
    pub agent_id: String,
    pub score: f64,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub processing_time_ms: u64,
    pub worker_id: String,
}

/// The final, aggregated outcome for a Record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub record_id: String,
    pub batch_id: String,
    pub agent_id: String,
    pub scores: HashMap<Dimension, f64>,
    pub final_score: f64,
    pub processing_errors: Vec<String>,
    pub processing_time_ms: u64,
    pub processed_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregate progress counters for a Batch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchCounters {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    pub batch_id: String,
    pub status: BatchStatus,
    pub counters: BatchCounters,
}

/// Liveness record for a dimension worker; TTL-bounded in the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLiveness {
    pub worker_id: String,
    pub last_heartbeat: chrono::DateTime<chrono::Utc>,
    pub status: String,
}

/// Per-dimension weight configuration. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weights(pub HashMap<Dimension, f64>);

impl Weights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        ALL_DIMENSIONS.iter().map(|d| self.get(*d)).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("dimension weights must sum to 1.0, got {sum}"));
        }
        if ALL_DIMENSIONS.iter().any(|d| self.get(*d) < 0.0) {
            return Err("dimension weights must be non-negative".to_string());
        }
        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert(Dimension::Instruction, crate::constants::DEFAULT_WEIGHT_INSTRUCTION);
        map.insert(
            Dimension::Hallucination,
            crate::constants::DEFAULT_WEIGHT_HALLUCINATION,
        );
        map.insert(Dimension::Assumption, crate::constants::DEFAULT_WEIGHT_ASSUMPTION);
        map.insert(Dimension::Coherence, crate::constants::DEFAULT_WEIGHT_COHERENCE);
        map.insert(Dimension::Accuracy, crate::constants::DEFAULT_WEIGHT_ACCURACY);
        Weights(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!(Weights::default().validate().is_ok());
    }

    #[test]
    fn dimension_round_trips_through_str() {
        for dim in ALL_DIMENSIONS {
            assert_eq!(Dimension::from_str(dim.as_str()).unwrap(), dim);
        }
    }

    #[test]
    fn weights_round_trip_through_json_with_dimension_keys() {
        let json = serde_json::to_string(&Weights::default()).unwrap();
        assert!(json.contains("\"hallucination\":0.25"));
        let parsed: Weights = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.get(Dimension::Hallucination), 0.25);
    }

    #[test]
    fn task_serialises_record_id_as_response_id_on_the_wire() {
        let record = Record::new("b1", "a1", "p", "r");
        let task = Task::from_record(&record);
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"response_id\""));
        assert!(!json.contains("\"record_id\""));
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.record_id, record.record_id);
        assert_eq!(parsed.dimensions.len(), ALL_DIMENSIONS.len());
    }

    #[test]
    fn task_from_record_copies_payload_and_mints_fresh_id() {
        let record = Record::new("batch-1", "agent-1", "p", "r");
        let task = Task::from_record(&record);
        assert_ne!(task.task_id, record.record_id);
        assert_eq!(task.record_id, record.record_id);
        assert_eq!(task.prompt, record.prompt);
    }
}
