//! EventLogStore port - Durable, TTL-bounded per-cycle event history.
//!
//! The log is the single source of truth for replay. Exactly one writer
//! appends to a given cycle's log at a time (the cycle's sequencer), so
//! implementations only need to be safe across different cycle ids.

use async_trait::async_trait;

use crate::domain::foundation::CycleId;
use crate::domain::progress::ProgressEvent;

/// Errors that can occur during event log operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventLogError {
    #[error("Event log store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    #[error("Corrupt event log entry for cycle {cycle_id}: {reason}")]
    Corrupt { cycle_id: CycleId, reason: String },
}

/// Port for the per-cycle progress event log.
#[async_trait]
pub trait EventLogStore: Send + Sync {
    /// Append an event to the cycle's log and refresh the log's TTL.
    ///
    /// # Returns
    /// The event's 0-based position in the log.
    async fn append(&self, cycle_id: &CycleId, event: &ProgressEvent)
        -> Result<u64, EventLogError>;

    /// Read the full log in append order.
    ///
    /// Returns an empty vector for unknown or expired cycles.
    async fn read_all(&self, cycle_id: &CycleId) -> Result<Vec<ProgressEvent>, EventLogError>;

    /// Remove the cycle's log atomically. A no-op when no log exists.
    async fn clear(&self, cycle_id: &CycleId) -> Result<(), EventLogError>;
}
