//! Progress module - lifecycle events emitted during a generation cycle.

mod event;

pub use event::{EventKind, ProgressEvent, SequencedEvent};
