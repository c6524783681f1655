//! Progress event value objects.
//!
//! A progress event is one typed lifecycle signal of a generation cycle.
//! On the wire it is always `{ "type": string, "message": string|null,
//! "data": any|null }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tag naming the lifecycle step an event describes.
///
/// The tag set is open: unknown tags read from the log survive a round trip
/// through [`EventKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Request,
    Prompt,
    Answer,
    Extract,
    Execute,
    Complete,
    Error,
    Other(String),
}

impl EventKind {
    /// Returns the wire tag for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Request => "request",
            EventKind::Prompt => "prompt",
            EventKind::Answer => "answer",
            EventKind::Extract => "extract",
            EventKind::Execute => "execute",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
            EventKind::Other(tag) => tag,
        }
    }

    /// `complete` and `error` end a cycle's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Complete | EventKind::Error)
    }
}

impl From<String> for EventKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "request" => EventKind::Request,
            "prompt" => EventKind::Prompt,
            "answer" => EventKind::Answer,
            "extract" => EventKind::Extract,
            "execute" => EventKind::Execute,
            "complete" => EventKind::Complete,
            "error" => EventKind::Error,
            _ => EventKind::Other(tag),
        }
    }
}

impl From<&str> for EventKind {
    fn from(tag: &str) -> Self {
        EventKind::from(tag.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle signal of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ProgressEvent {
    /// Creates an event with no message or payload.
    pub fn new(kind: impl Into<EventKind>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            data: None,
        }
    }

    /// Terminal success event carrying the run result.
    pub fn complete(data: Option<Value>) -> Self {
        Self {
            kind: EventKind::Complete,
            message: None,
            data,
        }
    }

    /// Terminal failure event carrying the failure message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

/// A progress event as carried on the live bus.
///
/// `seq` is the event's 0-based position in the cycle's durable log, or
/// `None` when the durable append failed. Viewers use it to stitch replayed
/// history and live delivery together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

impl SequencedEvent {
    pub fn new(seq: Option<u64>, event: ProgressEvent) -> Self {
        Self { seq, event }
    }
}
