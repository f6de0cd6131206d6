//! In-process in-flight table.
//!
//! Tracks which tasks the dispatch loop has fanned out but the collector
//! hasn't yet finalised. It exists purely to drive the concurrency cap and
//! give the sweeper a deadline to check against; it is not authoritative —
//! a restart loses it entirely, and nothing downstream depends on it
//! surviving one. The `status` CLI command rebuilds an equivalent count by
//! scanning `task:*:results` keys in the broker instead of reading this
//! table, per the design notes on recoverability.

use crate::models::Task;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub struct InFlightEntry {
    pub task_id: String,
    pub record_id: String,
    pub batch_id: String,
    pub started_at: Instant,
}

#[derive(Default)]
pub struct InFlightTable {
    entries: Mutex<HashMap<String, InFlightEntry>>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, task: &Task) {
        self.entries.lock().await.insert(
            task.task_id.clone(),
            InFlightEntry {
                task_id: task.task_id.clone(),
                record_id: task.record_id.clone(),
                batch_id: task.batch_id.clone(),
                started_at: Instant::now(),
            },
        );
    }

    /// Removes and returns the entry for `task_id`, if still in-flight.
    /// Called by the collector on finalisation and by the sweeper on
    /// timeout — whichever gets there first wins, and the other treats
    /// the task as already handled.
    pub async fn remove(&self, task_id: &str) -> Option<InFlightEntry> {
        self.entries.lock().await.remove(task_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes and returns every entry whose age exceeds `timeout`.
    pub async fn sweep_expired(&self, timeout: Duration) -> Vec<InFlightEntry> {
        let mut entries = self.entries.lock().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.started_at.elapsed() >= timeout)
            .map(|(task_id, _)| task_id.clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|task_id| entries.remove(&task_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[tokio::test]
    async fn insert_and_remove_round_trips() {
        let table = InFlightTable::new();
        let record = Record::new("b1", "a1", "p", "r");
        let task = Task::from_record(&record);
        table.insert(&task).await;
        assert_eq!(table.len().await, 1);

        let removed = table.remove(&task.task_id).await.unwrap();
        assert_eq!(removed.record_id, record.record_id);
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_expired_only_removes_old_entries() {
        let table = InFlightTable::new();
        let young = Task::from_record(&Record::new("b1", "a1", "p", "r"));
        table.insert(&young).await;

        let expired = table.sweep_expired(Duration::from_secs(0)).await;
        assert_eq!(expired.len(), 1);
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_leaves_entries_younger_than_timeout() {
        let table = InFlightTable::new();
        let task = Task::from_record(&Record::new("b1", "a1", "p", "r"));
        table.insert(&task).await;

        let expired = table.sweep_expired(Duration::from_secs(300)).await;
        assert!(expired.is_empty());
        assert_eq!(table.len().await, 1);
    }
}
