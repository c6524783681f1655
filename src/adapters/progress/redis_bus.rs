//! Redis pub/sub progress bus for multi-process deployments.
//!
//! Publishing goes through the shared multiplexed connection. Every
//! subscription opens its own dedicated connection, because a Redis
//! connection in subscriber mode cannot issue regular commands.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Msg};
use tokio::time::Instant;

use crate::domain::foundation::CycleId;
use crate::domain::progress::SequencedEvent;
use crate::ports::{BusItem, ProgressBus, ProgressBusError, ProgressSubscription};

use super::keys::ProgressKeys;

/// Redis pub/sub progress bus.
#[derive(Clone)]
pub struct RedisProgressBus {
    client: Client,
    conn: MultiplexedConnection,
    keys: ProgressKeys,
    timeout: Duration,
}

impl RedisProgressBus {
    pub fn new(
        client: Client,
        conn: MultiplexedConnection,
        keys: ProgressKeys,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            conn,
            keys,
            timeout,
        }
    }

    fn timed_out(&self) -> ProgressBusError {
        ProgressBusError::Unavailable(format!("redis did not respond within {:?}", self.timeout))
    }
}

#[async_trait]
impl ProgressBus for RedisProgressBus {
    async fn publish(
        &self,
        cycle_id: &CycleId,
        event: &SequencedEvent,
    ) -> Result<(), ProgressBusError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| ProgressBusError::Serialization(e.to_string()))?;
        let channel = self.keys.channel(cycle_id);
        let mut conn = self.conn.clone();

        tokio::time::timeout(self.timeout, conn.publish::<_, _, ()>(&channel, payload))
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| ProgressBusError::Unavailable(e.to_string()))
    }

    async fn subscribe(
        &self,
        cycle_id: &CycleId,
    ) -> Result<Box<dyn ProgressSubscription>, ProgressBusError> {
        let channel = self.keys.channel(cycle_id);
        let client = self.client.clone();

        let subscribed = async move {
            let mut pubsub = client.get_async_connection().await?.into_pubsub();
            pubsub.subscribe(&channel).await?;
            Ok::<_, redis::RedisError>(pubsub)
        };

        let pubsub = tokio::time::timeout(self.timeout, subscribed)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| ProgressBusError::Unavailable(e.to_string()))?;

        tracing::debug!(cycle_id = %cycle_id, "Subscribed to redis progress channel");

        Ok(Box::new(RedisSubscription {
            cycle_id: cycle_id.clone(),
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }
}

impl std::fmt::Debug for RedisProgressBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisProgressBus")
            .field("keys", &self.keys)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

struct RedisSubscription {
    cycle_id: CycleId,
    messages: Pin<Box<dyn Stream<Item = Msg> + Send>>,
}

#[async_trait]
impl ProgressSubscription for RedisSubscription {
    async fn next(&mut self, idle_timeout: Duration) -> BusItem {
        let deadline = Instant::now() + idle_timeout;

        loop {
            let msg = match tokio::time::timeout_at(deadline, self.messages.next()).await {
                Err(_) => return BusItem::Idle,
                Ok(None) => return BusItem::Closed,
                Ok(Some(msg)) => msg,
            };

            let parsed = msg
                .get_payload::<String>()
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    serde_json::from_str::<SequencedEvent>(&raw).map_err(|e| e.to_string())
                });

            match parsed {
                Ok(event) => return BusItem::Event(event),
                Err(error) => {
                    tracing::warn!(
                        cycle_id = %self.cycle_id,
                        error = %error,
                        "Skipping unparsable progress message"
                    );
                }
            }
        }
    }

    async fn unsubscribe(self: Box<Self>) {
        // Dropping the stream closes the dedicated pub/sub connection.
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    // Requires a running Redis instance.
    // Run with: CHAT2EDIT_TEST_REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored
    use super::*;
    use crate::domain::progress::{EventKind, ProgressEvent};

    async fn bus() -> RedisProgressBus {
        let url = std::env::var("CHAT2EDIT_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let client = Client::open(url).unwrap();
        let conn = client.get_multiplexed_tokio_connection().await.unwrap();
        RedisProgressBus::new(
            client,
            conn,
            ProgressKeys::new("chat2edit:test:bus:"),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    #[ignore]
    async fn subscriber_receives_published_event() {
        let bus = bus().await;
        let id = CycleId::new();
        let mut sub = bus.subscribe(&id).await.unwrap();

        let event = SequencedEvent::new(Some(0), ProgressEvent::new(EventKind::Request));
        bus.publish(&id, &event).await.unwrap();

        assert_eq!(sub.next(Duration::from_secs(2)).await, BusItem::Event(event));
        sub.unsubscribe().await;
    }

    #[tokio::test]
    #[ignore]
    async fn unparsable_payload_is_skipped() {
        let bus = bus().await;
        let id = CycleId::new();
        let mut sub = bus.subscribe(&id).await.unwrap();

        let mut conn = bus.conn.clone();
        conn.publish::<_, _, ()>(bus.keys.channel(&id), "not json").await.unwrap();
        let event = SequencedEvent::new(Some(1), ProgressEvent::new(EventKind::Prompt));
        bus.publish(&id, &event).await.unwrap();

        assert_eq!(sub.next(Duration::from_secs(2)).await, BusItem::Event(event));
    }

    #[tokio::test]
    #[ignore]
    async fn quiet_channel_reports_idle() {
        let bus = bus().await;
        let mut sub = bus.subscribe(&CycleId::new()).await.unwrap();

        assert_eq!(sub.next(Duration::from_millis(100)).await, BusItem::Idle);
    }
}
