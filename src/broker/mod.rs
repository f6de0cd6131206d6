//! Queue broker boundary.
//!
//! The real substrate is an external key/list/hash-capable broker
//! (Redis or compatible). The core never talks to it directly; every
//! loop goes through this trait so the scheduling logic can be
//! exercised against [`InMemoryBroker`] in tests without a live broker.

mod in_memory;
mod redis_broker;

pub use in_memory::InMemoryBroker;
pub use redis_broker::RedisBroker;

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// List + hash + key/value operations the orchestrator needs from the
/// broker. FIFO list semantics: `append` pushes to the tail, `pop_head`
/// pops from the head.
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Append a JSON-encoded payload to the named list.
    async fn append(&self, queue: &str, payload: String) -> Result<()>;

    /// Non-blocking pop from the head of the named list.
    async fn pop_head(&self, queue: &str) -> Result<Option<String>>;

    /// Current length of the named list.
    async fn length(&self, queue: &str) -> Result<usize>;

    /// Remove all entries from the named list.
    async fn clear(&self, queue: &str) -> Result<()>;

    /// Set one field of a hash.
    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()>;

    /// Number of fields currently set on a hash.
    async fn hash_len(&self, key: &str) -> Result<usize>;

    /// Every field/value pair currently set on a hash.
    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>>;

    /// Delete a key (hash or string) outright.
    async fn del(&self, key: &str) -> Result<()>;

    /// Set (or refresh) a TTL on a key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Set a string key with a TTL.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Read a string key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Keys matching a glob-style pattern (used by the CLI's `status`
    /// command to recover in-flight counts by scanning
    /// `task:*:results`, per the design notes on the in-flight table
    /// being rebuildable from the broker).
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Poll `pop_head` until a payload arrives or `timeout` elapses,
/// sleeping `crate::constants::BROKER_POLL_INTERVAL_MS` between
/// attempts. This is the "simulated blocking pop" the design notes
/// call for: the broker interface itself stays non-blocking so a
/// broker with a native blocking pop could be swapped in without
/// changing callers.
pub async fn pop_head_blocking(
    broker: &dyn QueueBroker,
    queue: &str,
    timeout: Duration,
) -> Result<Option<String>> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(payload) = broker.pop_head(queue).await? {
            return Ok(Some(payload));
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(
            crate::constants::BROKER_POLL_INTERVAL_MS,
        ))
        .await;
    }
}
