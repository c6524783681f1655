//! In-process progress bus built on per-cycle broadcast rooms.
//!
//! Suitable for single-process deployments and tests. Each cycle with at
//! least one subscriber owns a `broadcast` channel; publishing to a cycle
//! without subscribers is a no-op.
//!
//! ```text
//! Room: c1             Room: c2
//! ├── viewer-a         └── viewer-d
//! └── viewer-b
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

use crate::domain::foundation::CycleId;
use crate::domain::progress::SequencedEvent;
use crate::ports::{BusItem, ProgressBus, ProgressBusError, ProgressSubscription};

type Rooms = Arc<RwLock<HashMap<CycleId, broadcast::Sender<SequencedEvent>>>>;

/// In-memory progress bus.
///
/// # Thread Safety
///
/// Uses `RwLock` for the room registry since publishes (reads) vastly
/// outnumber subscribes/unsubscribes (writes).
#[derive(Debug, Clone)]
pub struct InMemoryProgressBus {
    rooms: Rooms,
    channel_capacity: usize,
}

impl InMemoryProgressBus {
    /// Create a bus whose rooms buffer up to `channel_capacity` events per
    /// subscriber. A subscriber that falls further behind observes
    /// [`BusItem::Lagged`].
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Number of live subscriptions for a cycle.
    pub async fn subscriber_count(&self, cycle_id: &CycleId) -> usize {
        self.rooms
            .read()
            .await
            .get(cycle_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of cycles that currently have a room.
    pub async fn active_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for InMemoryProgressBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ProgressBus for InMemoryProgressBus {
    async fn publish(
        &self,
        cycle_id: &CycleId,
        event: &SequencedEvent,
    ) -> Result<(), ProgressBusError> {
        let rooms = self.rooms.read().await;

        if let Some(sender) = rooms.get(cycle_id) {
            // No receivers is fine: nobody is watching this cycle right now.
            let _ = sender.send(event.clone());
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        cycle_id: &CycleId,
    ) -> Result<Box<dyn ProgressSubscription>, ProgressBusError> {
        let mut rooms = self.rooms.write().await;

        let sender = rooms.entry(cycle_id.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.channel_capacity);
            tx
        });

        Ok(Box::new(InMemorySubscription {
            cycle_id: cycle_id.clone(),
            receiver: Some(sender.subscribe()),
            rooms: Arc::clone(&self.rooms),
        }))
    }
}

fn remove_if_empty(
    rooms: &mut HashMap<CycleId, broadcast::Sender<SequencedEvent>>,
    cycle_id: &CycleId,
) {
    if rooms
        .get(cycle_id)
        .is_some_and(|sender| sender.receiver_count() == 0)
    {
        rooms.remove(cycle_id);
    }
}

/// One subscriber's receiver. Dropping it, with or without
/// [`ProgressSubscription::unsubscribe`], releases the room once empty.
struct InMemorySubscription {
    cycle_id: CycleId,
    /// `None` once released.
    receiver: Option<broadcast::Receiver<SequencedEvent>>,
    rooms: Rooms,
}

#[async_trait]
impl ProgressSubscription for InMemorySubscription {
    async fn next(&mut self, idle_timeout: Duration) -> BusItem {
        let Some(receiver) = self.receiver.as_mut() else {
            return BusItem::Closed;
        };

        match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Err(_) => BusItem::Idle,
            Ok(Ok(event)) => BusItem::Event(event),
            Ok(Err(RecvError::Lagged(skipped))) => BusItem::Lagged(skipped),
            Ok(Err(RecvError::Closed)) => BusItem::Closed,
        }
    }

    async fn unsubscribe(self: Box<Self>) {
        let mut subscription = self;
        if subscription.receiver.take().is_some() {
            let mut rooms = subscription.rooms.write().await;
            remove_if_empty(&mut rooms, &subscription.cycle_id);
        }
    }
}

impl Drop for InMemorySubscription {
    fn drop(&mut self) {
        if self.receiver.take().is_none() {
            return;
        }

        if let Ok(mut rooms) = self.rooms.try_write() {
            remove_if_empty(&mut rooms, &self.cycle_id);
            return;
        }

        // Registry is busy; finish the cleanup on the runtime.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let rooms = Arc::clone(&self.rooms);
            let cycle_id = self.cycle_id.clone();
            runtime.spawn(async move {
                let mut rooms = rooms.write().await;
                remove_if_empty(&mut rooms, &cycle_id);
            });
        }
    }
}
