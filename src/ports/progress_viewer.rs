//! ProgressViewer port - The transport side of one viewer connection.

use async_trait::async_trait;

use crate::domain::progress::ProgressEvent;

/// Errors raised by a viewer transport.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ViewerError {
    #[error("Viewer disconnected")]
    Disconnected,

    #[error("Viewer transport error: {0}")]
    Transport(String),
}

/// One attached remote viewer.
#[async_trait]
pub trait ProgressViewer: Send {
    /// Deliver one event to the viewer.
    async fn send(&mut self, event: &ProgressEvent) -> Result<(), ViewerError>;

    /// Resolves once the viewer's transport has gone away.
    ///
    /// Must be cancel-safe; it is raced against the live subscription.
    async fn disconnected(&mut self);

    /// Non-blocking liveness check used while the stream is idle.
    async fn probe(&mut self) -> bool {
        true
    }

    /// Close the transport. Called exactly once when the relay ends.
    async fn close(&mut self);
}
