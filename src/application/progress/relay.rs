//! ProgressRelay - Replay-then-tail delivery of a cycle's events to a viewer.
//!
//! Per attach:
//! 1. Subscribe to the bus first, so nothing published from now on is missed
//! 2. Replay the event log and remember how many events were delivered
//! 3. Tail the subscription, using each message's log ordinal to skip
//!    events already replayed and to re-read the log when a gap shows up
//! 4. Stop after a terminal event, a viewer disconnect, or an error
//!
//! Every exit path unsubscribes and closes the viewer. A relay dropped
//! mid-stream still releases its subscription when the handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::foundation::CycleId;
use crate::domain::progress::{EventKind, ProgressEvent, SequencedEvent};
use crate::ports::{
    BusItem, EventLogError, EventLogStore, ProgressBus, ProgressBusError, ProgressSubscription,
    ProgressViewer, ViewerError,
};

/// Default time the relay waits for a live event before probing the viewer.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Why a relay ended normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayExit {
    /// A `complete` or `error` event was delivered.
    Terminal(EventKind),
    ViewerDisconnected,
}

/// Why a relay ended abnormally.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    #[error("Failed to replay progress history: {0}")]
    Replay(#[from] EventLogError),

    #[error("Failed to subscribe to progress updates: {0}")]
    Subscribe(#[from] ProgressBusError),

    #[error("Progress updates ended unexpectedly")]
    BusClosed,

    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

enum Step {
    Bus(BusItem),
    Disconnected,
}

/// Streams one cycle's progress to viewers.
#[derive(Clone)]
pub struct ProgressRelay {
    store: Arc<dyn EventLogStore>,
    bus: Arc<dyn ProgressBus>,
    idle_timeout: Duration,
}

impl ProgressRelay {
    pub fn new(
        store: Arc<dyn EventLogStore>,
        bus: Arc<dyn ProgressBus>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            store,
            bus,
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// The cycle's full event log, for polling readers.
    pub async fn history(&self, cycle_id: &CycleId) -> Result<Vec<ProgressEvent>, EventLogError> {
        self.store.read_all(cycle_id).await
    }

    /// Run the relay for one viewer until the stream ends.
    ///
    /// On error the viewer is sent a synthetic `error` event before it is
    /// closed, unless the viewer itself is what failed.
    pub async fn attach(
        &self,
        cycle_id: &CycleId,
        viewer: &mut dyn ProgressViewer,
    ) -> Result<RelayExit, RelayError> {
        let result = match self.bus.subscribe(cycle_id).await {
            Ok(mut subscription) => {
                let result = self.stream(cycle_id, subscription.as_mut(), viewer).await;
                subscription.unsubscribe().await;
                result
            }
            Err(e) => Err(RelayError::from(e)),
        };

        let result = match result {
            Err(RelayError::Viewer(ViewerError::Disconnected)) => Ok(RelayExit::ViewerDisconnected),
            other => other,
        };

        match &result {
            Ok(RelayExit::Terminal(kind)) => {
                tracing::debug!(cycle_id = %cycle_id, kind = %kind, "Relay delivered terminal event");
            }
            Ok(RelayExit::ViewerDisconnected) => {
                tracing::debug!(cycle_id = %cycle_id, "Viewer disconnected");
            }
            Err(RelayError::Viewer(e)) => {
                tracing::debug!(cycle_id = %cycle_id, error = %e, "Viewer transport failed");
            }
            Err(e) => {
                tracing::warn!(cycle_id = %cycle_id, error = %e, "Relay failed");
                if let Err(send_error) = viewer.send(&ProgressEvent::error(e.to_string())).await {
                    tracing::debug!(
                        cycle_id = %cycle_id,
                        error = %send_error,
                        "Could not notify viewer of relay failure"
                    );
                }
            }
        }

        viewer.close().await;
        result
    }

    async fn stream(
        &self,
        cycle_id: &CycleId,
        subscription: &mut dyn ProgressSubscription,
        viewer: &mut dyn ProgressViewer,
    ) -> Result<RelayExit, RelayError> {
        let mut delivered: u64 = 0;

        if let Some(kind) = self.catch_up(cycle_id, &mut delivered, viewer).await? {
            return Ok(RelayExit::Terminal(kind));
        }

        loop {
            let step = tokio::select! {
                item = subscription.next(self.idle_timeout) => Step::Bus(item),
                _ = viewer.disconnected() => Step::Disconnected,
            };

            match step {
                Step::Disconnected => return Ok(RelayExit::ViewerDisconnected),
                Step::Bus(BusItem::Idle) => {
                    if !viewer.probe().await {
                        return Ok(RelayExit::ViewerDisconnected);
                    }
                }
                Step::Bus(BusItem::Closed) => return Err(RelayError::BusClosed),
                Step::Bus(BusItem::Lagged(skipped)) => {
                    tracing::debug!(cycle_id = %cycle_id, skipped, "Relay lagged, re-reading log");
                    if let Some(kind) = self.catch_up(cycle_id, &mut delivered, viewer).await? {
                        return Ok(RelayExit::Terminal(kind));
                    }
                }
                Step::Bus(BusItem::Event(message)) => {
                    if let Some(kind) = self
                        .deliver_live(cycle_id, message, &mut delivered, viewer)
                        .await?
                    {
                        return Ok(RelayExit::Terminal(kind));
                    }
                }
            }
        }
    }

    async fn deliver_live(
        &self,
        cycle_id: &CycleId,
        message: SequencedEvent,
        delivered: &mut u64,
        viewer: &mut dyn ProgressViewer,
    ) -> Result<Option<EventKind>, RelayError> {
        let SequencedEvent { seq, event } = message;

        match seq {
            // Never made it into the log; the bus is the only copy.
            None => {}
            Some(seq) if seq < *delivered => {
                tracing::trace!(cycle_id = %cycle_id, seq, "Skipping replayed event");
                return Ok(None);
            }
            Some(seq) if seq == *delivered => *delivered += 1,
            Some(seq) => {
                tracing::debug!(
                    cycle_id = %cycle_id,
                    seq,
                    delivered = *delivered,
                    "Gap in live events, re-reading log"
                );
                if let Some(kind) = self.catch_up(cycle_id, delivered, viewer).await? {
                    return Ok(Some(kind));
                }
                if seq < *delivered {
                    return Ok(None);
                }
                // The log no longer holds it (cleared or expired).
                *delivered = seq + 1;
            }
        }

        viewer.send(&event).await?;
        Ok(event.is_terminal().then_some(event.kind))
    }

    /// Deliver every logged event past `delivered`. Returns the terminal
    /// kind if one was delivered.
    async fn catch_up(
        &self,
        cycle_id: &CycleId,
        delivered: &mut u64,
        viewer: &mut dyn ProgressViewer,
    ) -> Result<Option<EventKind>, RelayError> {
        let history = self.store.read_all(cycle_id).await?;

        for event in history.into_iter().skip(*delivered as usize) {
            viewer.send(&event).await?;
            *delivered += 1;
            if event.is_terminal() {
                return Ok(Some(event.kind));
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for ProgressRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressRelay")
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}
