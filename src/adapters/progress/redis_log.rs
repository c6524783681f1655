//! Redis-backed event log store for production deployments.
//!
//! Each cycle's log is a Redis list of JSON-encoded events:
//! 1. `append` runs RPUSH + EXPIRE as one MULTI/EXEC pipeline, so the TTL is
//!    refreshed atomically with every write
//! 2. `read_all` is a single LRANGE 0 -1
//! 3. `clear` is a single DEL, which readers observe atomically

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::CycleId;
use crate::domain::progress::ProgressEvent;
use crate::ports::{EventLogError, EventLogStore};

use super::keys::ProgressKeys;

/// Redis-backed event log store.
#[derive(Clone)]
pub struct RedisEventLogStore {
    conn: MultiplexedConnection,
    keys: ProgressKeys,
    ttl: Duration,
    timeout: Duration,
}

impl RedisEventLogStore {
    /// Create a new Redis event log store.
    ///
    /// `timeout` bounds every Redis round trip so an unreachable server
    /// surfaces as [`EventLogError::Unavailable`] instead of a hang.
    pub fn new(
        conn: MultiplexedConnection,
        keys: ProgressKeys,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            conn,
            keys,
            ttl,
            timeout,
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, EventLogError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(result) => result.map_err(|e| EventLogError::Unavailable(e.to_string())),
            Err(_) => Err(EventLogError::Unavailable(format!(
                "redis did not respond within {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl EventLogStore for RedisEventLogStore {
    async fn append(
        &self,
        cycle_id: &CycleId,
        event: &ProgressEvent,
    ) -> Result<u64, EventLogError> {
        let payload =
            serde_json::to_string(event).map_err(|e| EventLogError::Serialization(e.to_string()))?;
        let key = self.keys.log_key(cycle_id);
        let ttl_secs = self.ttl.as_secs().max(1) as i64;
        let mut conn = self.conn.clone();

        let (length,): (u64,) = self
            .run(async move {
                redis::pipe()
                    .atomic()
                    .rpush(&key, payload)
                    .expire(&key, ttl_secs)
                    .ignore()
                    .query_async(&mut conn)
                    .await
            })
            .await?;

        Ok(length.saturating_sub(1))
    }

    async fn read_all(&self, cycle_id: &CycleId) -> Result<Vec<ProgressEvent>, EventLogError> {
        let key = self.keys.log_key(cycle_id);
        let mut conn = self.conn.clone();

        let entries: Vec<String> = self
            .run(async move { conn.lrange(&key, 0, -1).await })
            .await?;

        entries
            .iter()
            .map(|entry| {
                serde_json::from_str(entry).map_err(|e| EventLogError::Corrupt {
                    cycle_id: cycle_id.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn clear(&self, cycle_id: &CycleId) -> Result<(), EventLogError> {
        let key = self.keys.log_key(cycle_id);
        let mut conn = self.conn.clone();

        self.run(async move { conn.del::<_, ()>(&key).await }).await
    }
}

impl std::fmt::Debug for RedisEventLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEventLogStore")
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    // Requires a running Redis instance.
    // Run with: CHAT2EDIT_TEST_REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored
    use super::*;
    use crate::domain::progress::EventKind;

    async fn store(prefix: &str) -> RedisEventLogStore {
        let url = std::env::var("CHAT2EDIT_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let client = redis::Client::open(url).unwrap();
        let conn = client.get_multiplexed_tokio_connection().await.unwrap();
        RedisEventLogStore::new(
            conn,
            ProgressKeys::new(prefix),
            Duration::from_secs(60),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    #[ignore]
    async fn append_read_clear_round_trip() {
        let store = store("chat2edit:test:log:").await;
        let id = CycleId::new();

        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap(), 0);
        assert_eq!(
            store
                .append(&id, &ProgressEvent::complete(Some(serde_json::json!({"ok": true}))))
                .await
                .unwrap(),
            1
        );

        let events = store.read_all(&id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());

        store.clear(&id).await.unwrap();
        assert!(store.read_all(&id).await.unwrap().is_empty());
        store.clear(&id).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn append_sets_ttl() {
        let store = store("chat2edit:test:ttl:").await;
        let id = CycleId::new();
        store.append(&id, &ProgressEvent::new(EventKind::Prompt)).await.unwrap();

        let mut conn = store.conn.clone();
        let ttl: i64 = conn.ttl(store.keys.log_key(&id)).await.unwrap();
        assert!(ttl > 0 && ttl <= 60);

        store.clear(&id).await.unwrap();
    }
}
