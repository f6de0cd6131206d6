use super::QueueBroker;
use crate::{OrchestratorError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

/// Broker implementation backed by a real Redis-compatible server.
/// Uses a multiplexed async connection so a single client can be
/// shared across the dispatch, collector, and sweeper loops without
/// per-call connection setup.
pub struct RedisBroker {
    client: redis::Client,
}

impl RedisBroker {
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| OrchestratorError::Queue(format!("invalid broker url: {e}")))?;
        Ok(Self { client })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| OrchestratorError::Queue(format!("connection failed: {e}")))
    }
}

fn queue_err(e: redis::RedisError) -> OrchestratorError {
    OrchestratorError::Queue(e.to_string())
}

#[async_trait]
impl QueueBroker for RedisBroker {
    async fn append(&self, queue: &str, payload: String) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.rpush(queue, payload).await.map_err(queue_err)?;
        Ok(())
    }

    async fn pop_head(&self, queue: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.lpop(queue, None).await.map_err(queue_err)
    }

    async fn length(&self, queue: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        let len: i64 = conn.llen(queue).await.map_err(queue_err)?;
        Ok(len.max(0) as usize)
    }

    async fn clear(&self, queue: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(queue).await.map_err(queue_err)?;
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.hset(key, field, value).await.map_err(queue_err)?;
        Ok(())
    }

    async fn hash_len(&self, key: &str) -> Result<usize> {
        let mut conn = self.conn().await?;
        let len: i64 = conn.hlen(key).await.map_err(queue_err)?;
        Ok(len.max(0) as usize)
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>> {
        let mut conn = self.conn().await?;
        let pairs: Vec<(String, String)> = conn.hgetall(key).await.map_err(queue_err)?;
        Ok(pairs)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await.map_err(queue_err)?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .map_err(queue_err)?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .set_ex(key, value, ttl.as_secs())
            .await
            .map_err(queue_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.get(key).await.map_err(queue_err)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let keys: Vec<String> = conn.keys(pattern).await.map_err(queue_err)?;
        Ok(keys)
    }
}
