//! WebSocket transport for progress viewers.
//!
//! Each progress event is sent as one text frame holding the event JSON.
//! Frames from the client are ignored; a close frame, a read error or the
//! end of the stream marks the viewer as disconnected.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::domain::progress::ProgressEvent;
use crate::ports::{ProgressViewer, ViewerError};

/// A progress viewer attached over a WebSocket.
///
/// Generic over the socket halves; [`WebSocketViewer::new`] splits an axum
/// socket.
pub struct WebSocketViewer<S = SplitSink<WebSocket, Message>, R = SplitStream<WebSocket>> {
    sender: S,
    receiver: R,
    open: bool,
}

impl WebSocketViewer {
    pub fn new(socket: WebSocket) -> Self {
        let (sender, receiver) = socket.split();
        Self::from_parts(sender, receiver)
    }
}

impl<S, R> WebSocketViewer<S, R> {
    pub fn from_parts(sender: S, receiver: R) -> Self {
        Self {
            sender,
            receiver,
            open: true,
        }
    }
}

#[async_trait]
impl<S, R, E> ProgressViewer for WebSocketViewer<S, R>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: Send,
{
    async fn send(&mut self, event: &ProgressEvent) -> Result<(), ViewerError> {
        if !self.open {
            return Err(ViewerError::Disconnected);
        }

        let json =
            serde_json::to_string(event).map_err(|e| ViewerError::Transport(e.to_string()))?;

        if self.sender.send(Message::Text(json)).await.is_err() {
            self.open = false;
            return Err(ViewerError::Disconnected);
        }
        Ok(())
    }

    async fn disconnected(&mut self) {
        if !self.open {
            return;
        }

        loop {
            match self.receiver.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {
                    self.open = false;
                    return;
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    async fn probe(&mut self) -> bool {
        if !self.open {
            return false;
        }

        if self.sender.send(Message::Ping(Vec::new())).await.is_err() {
            self.open = false;
        }
        self.open
    }

    async fn close(&mut self) {
        if self.open {
            let _ = self.sender.send(Message::Close(None)).await;
            self.open = false;
        }
        let _ = self.sender.close().await;
    }
}
