//! In-memory event log store.
//!
//! Keeps each cycle's log in process memory with the same TTL semantics as
//! the Redis adapter: every append pushes the expiry out to `ttl` from now,
//! and an expired log reads as empty. Time comes from `tokio::time`, so a
//! paused test runtime can advance the clock deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::foundation::CycleId;
use crate::domain::progress::ProgressEvent;
use crate::ports::{EventLogError, EventLogStore};

#[derive(Debug, Clone)]
struct CycleLog {
    events: Vec<ProgressEvent>,
    expires_at: Instant,
}

impl CycleLog {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory storage for progress event logs.
#[derive(Debug, Clone)]
pub struct InMemoryEventLogStore {
    logs: Arc<RwLock<HashMap<CycleId, CycleLog>>>,
    ttl: Duration,
}

impl InMemoryEventLogStore {
    /// Create a store whose logs live for `ttl` after their last append.
    pub fn new(ttl: Duration) -> Self {
        Self {
            logs: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Drop every expired log. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|_, log| !log.is_expired(now));
        before - logs.len()
    }

    /// Number of logs currently held, expired or not.
    pub async fn log_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

impl Default for InMemoryEventLogStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[async_trait]
impl EventLogStore for InMemoryEventLogStore {
    async fn append(
        &self,
        cycle_id: &CycleId,
        event: &ProgressEvent,
    ) -> Result<u64, EventLogError> {
        let now = Instant::now();
        let mut logs = self.logs.write().await;

        let log = logs.entry(cycle_id.clone()).or_insert_with(|| CycleLog {
            events: Vec::new(),
            expires_at: now,
        });
        if log.is_expired(now) {
            log.events.clear();
        }

        log.events.push(event.clone());
        log.expires_at = now + self.ttl;

        Ok((log.events.len() - 1) as u64)
    }

    async fn read_all(&self, cycle_id: &CycleId) -> Result<Vec<ProgressEvent>, EventLogError> {
        let now = Instant::now();
        let logs = self.logs.read().await;

        Ok(logs
            .get(cycle_id)
            .filter(|log| !log.is_expired(now))
            .map(|log| log.events.clone())
            .unwrap_or_default())
    }

    async fn clear(&self, cycle_id: &CycleId) -> Result<(), EventLogError> {
        self.logs.write().await.remove(cycle_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::progress::EventKind;

    fn cycle(id: &str) -> CycleId {
        CycleId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn append_returns_positions_in_order() {
        let store = InMemoryEventLogStore::default();
        let id = cycle("c1");

        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap(), 0);
        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Prompt)).await.unwrap(), 1);
        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Answer)).await.unwrap(), 2);

        let kinds: Vec<_> = store
            .read_all(&id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EventKind::Request, EventKind::Prompt, EventKind::Answer]);
    }

    #[tokio::test]
    async fn read_all_unknown_cycle_is_empty() {
        let store = InMemoryEventLogStore::default();
        assert!(store.read_all(&cycle("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycles_are_isolated() {
        let store = InMemoryEventLogStore::default();
        store.append(&cycle("a"), &ProgressEvent::new(EventKind::Request)).await.unwrap();

        assert_eq!(store.append(&cycle("b"), &ProgressEvent::new(EventKind::Prompt)).await.unwrap(), 0);
        assert_eq!(store.read_all(&cycle("a")).await.unwrap().len(), 1);
        assert_eq!(store.read_all(&cycle("b")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryEventLogStore::default();
        let id = cycle("c1");

        store.clear(&id).await.unwrap();
        store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap();
        store.clear(&id).await.unwrap();
        store.clear(&id).await.unwrap();

        assert!(store.read_all(&id).await.unwrap().is_empty());
        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Prompt)).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn log_expires_after_ttl_without_appends() {
        let store = InMemoryEventLogStore::new(Duration::from_secs(60));
        let id = cycle("c1");
        store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.read_all(&id).await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.read_all(&id).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn append_refreshes_ttl() {
        let store = InMemoryEventLogStore::new(Duration::from_secs(60));
        let id = cycle("c1");
        store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        store.append(&id, &ProgressEvent::new(EventKind::Prompt)).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(store.read_all(&id).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn append_after_expiry_starts_a_fresh_log() {
        let store = InMemoryEventLogStore::new(Duration::from_secs(10));
        let id = cycle("c1");
        store.append(&id, &ProgressEvent::new(EventKind::Request)).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.append(&id, &ProgressEvent::new(EventKind::Prompt)).await.unwrap(), 0);
        assert_eq!(store.read_all(&id).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge_expired_removes_only_stale_logs() {
        let store = InMemoryEventLogStore::new(Duration::from_secs(10));
        store.append(&cycle("old"), &ProgressEvent::new(EventKind::Request)).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.append(&cycle("new"), &ProgressEvent::new(EventKind::Request)).await.unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.log_count().await, 1);
    }
}
