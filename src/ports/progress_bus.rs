//! ProgressBus port - Best-effort live fan-out of progress events.
//!
//! Each subscriber to a cycle receives every event published after it
//! subscribed, at most once. There is no delivery to subscribers that were
//! not yet attached, which is why viewers always replay the
//! [`EventLogStore`](super::EventLogStore) as well.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::CycleId;
use crate::domain::progress::SequencedEvent;

/// Errors that can occur on the live bus.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgressBusError {
    #[error("Progress bus unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize event: {0}")]
    Serialization(String),
}

/// Outcome of waiting on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum BusItem {
    /// A newly published event.
    Event(SequencedEvent),
    /// Nothing arrived within the idle timeout.
    Idle,
    /// The subscriber fell behind and `n` events were dropped for it.
    Lagged(u64),
    /// The subscription can no longer deliver events.
    Closed,
}

/// A live, per-cycle subscription handle.
///
/// Dropping the handle without calling `unsubscribe` must still release it.
#[async_trait]
pub trait ProgressSubscription: Send {
    /// Wait up to `idle_timeout` for the next event.
    ///
    /// Must be cancel-safe: dropping the returned future loses no event.
    async fn next(&mut self, idle_timeout: Duration) -> BusItem;

    /// Detach from the bus and release the underlying resources.
    async fn unsubscribe(self: Box<Self>);
}

/// Port for publishing and subscribing to live progress events.
#[async_trait]
pub trait ProgressBus: Send + Sync {
    /// Publish an event to every current subscriber of the cycle.
    async fn publish(&self, cycle_id: &CycleId, event: &SequencedEvent)
        -> Result<(), ProgressBusError>;

    /// Subscribe to the cycle's live events.
    ///
    /// Once this returns, every later `publish` for the cycle is delivered
    /// to the returned subscription.
    async fn subscribe(
        &self,
        cycle_id: &CycleId,
    ) -> Result<Box<dyn ProgressSubscription>, ProgressBusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_bus_object_safe(_: &dyn ProgressBus) {}

    #[allow(dead_code)]
    fn assert_subscription_object_safe(_: &dyn ProgressSubscription) {}
}
