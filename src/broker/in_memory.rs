use super::QueueBroker;
use crate::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// In-process stand-in for the broker, used by tests and local
/// development so the dispatch/collector/sweeper loops can be
/// exercised without a live Redis: `Vec`/`HashMap` behind a
/// `tokio::sync::Mutex`, one per named resource.
#[derive(Default)]
pub struct InMemoryBroker {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
    strings: Mutex<HashMap<String, String>>,
    expirations: Mutex<HashMap<String, Instant>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn shared() -> Arc<Self> {
        Self::new().wrap()
    }

    async fn is_expired(&self, key: &str) -> bool {
        let expirations = self.expirations.lock().await;
        matches!(expirations.get(key), Some(at) if Instant::now() >= *at)
    }

    async fn evict_if_expired(&self, key: &str) {
        if self.is_expired(key).await {
            self.hashes.lock().await.remove(key);
            self.strings.lock().await.remove(key);
            self.expirations.lock().await.remove(key);
        }
    }
}

#[async_trait]
impl QueueBroker for InMemoryBroker {
    async fn append(&self, queue: &str, payload: String) -> Result<()> {
        let mut lists = self.lists.lock().await;
        lists.entry(queue.to_string()).or_default().push_back(payload);
        Ok(())
    }

    async fn pop_head(&self, queue: &str) -> Result<Option<String>> {
        let mut lists = self.lists.lock().await;
        Ok(lists.get_mut(queue).and_then(|q| q.pop_front()))
    }

    async fn length(&self, queue: &str) -> Result<usize> {
        let lists = self.lists.lock().await;
        Ok(lists.get(queue).map(|q| q.len()).unwrap_or(0))
    }

    async fn clear(&self, queue: &str) -> Result<()> {
        let mut lists = self.lists.lock().await;
        lists.remove(queue);
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        self.evict_if_expired(key).await;
        let mut hashes = self.hashes.lock().await;
        hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hash_len(&self, key: &str) -> Result<usize> {
        self.evict_if_expired(key).await;
        let hashes = self.hashes.lock().await;
        Ok(hashes.get(key).map(|h| h.len()).unwrap_or(0))
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>> {
        self.evict_if_expired(key).await;
        let hashes = self.hashes.lock().await;
        Ok(hashes
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.hashes.lock().await.remove(key);
        self.strings.lock().await.remove(key);
        self.expirations.lock().await.remove(key);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.expirations
            .lock()
            .await
            .insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.strings.lock().await.insert(key.to_string(), value);
        self.expire(key, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.evict_if_expired(key).await;
        let strings = self.strings.lock().await;
        Ok(strings.get(key).cloned())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let hashes = self.hashes.lock().await;
        let strings = self.strings.lock().await;
        let mut matches: Vec<String> = hashes
            .keys()
            .chain(strings.keys())
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        matches.sort();
        matches.dedup();
        Ok(matches)
    }
}

/// Matches Redis-style `KEYS`-pattern wildcards (`*` only — the patterns
/// this crate issues never use `?` or character classes). `*` may appear
/// anywhere in the pattern, not just at the end (e.g. `task:*:results`).
fn glob_match(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(segment) {
                return false;
            }
            rest = &rest[segment.len()..];
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_match_supports_wildcard_in_the_middle() {
        assert!(glob_match("task:*:results", "task:abc-123:results"));
        assert!(!glob_match("task:*:results", "task:abc-123:progress"));
        assert!(glob_match("worker:*:status", "worker:w1:status"));
        assert!(glob_match("batch:*", "batch:b1"));
    }

    #[tokio::test]
    async fn fifo_list_semantics() {
        let broker = InMemoryBroker::new();
        broker.append("q", "a".into()).await.unwrap();
        broker.append("q", "b".into()).await.unwrap();
        assert_eq!(broker.length("q").await.unwrap(), 2);
        assert_eq!(broker.pop_head("q").await.unwrap(), Some("a".into()));
        assert_eq!(broker.pop_head("q").await.unwrap(), Some("b".into()));
        assert_eq!(broker.pop_head("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn hash_fields_accumulate_and_delete() {
        let broker = InMemoryBroker::new();
        broker.hash_set("k", "a", "1".into()).await.unwrap();
        broker.hash_set("k", "b", "2".into()).await.unwrap();
        assert_eq!(broker.hash_len("k").await.unwrap(), 2);
        broker.del("k").await.unwrap();
        assert_eq!(broker.hash_len("k").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expired_keys_are_evicted_on_access() {
        let broker = InMemoryBroker::new();
        broker.hash_set("k", "a", "1".into()).await.unwrap();
        broker.expire("k", Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(broker.hash_len("k").await.unwrap(), 0);
    }
}
