//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Progress Ports
//!
//! - `EventLogStore` - Durable per-cycle event history used for replay
//! - `ProgressBus` - Live per-cycle fan-out to attached viewers
//! - `ProgressViewer` - Transport side of one viewer connection
//!
//! ## Collaborator Ports
//!
//! - `GenerationTask` / `GenerationSink` - The agent and its progress hooks
//! - `ObjectStorage` - File upload/download service

mod event_log_store;
mod generation_task;
mod object_storage;
mod progress_bus;
mod progress_viewer;

pub use event_log_store::{EventLogError, EventLogStore};
pub use generation_task::{GenerationSink, GenerationTask};
pub use object_storage::{ObjectStorage, StorageError};
pub use progress_bus::{BusItem, ProgressBus, ProgressBusError, ProgressSubscription};
pub use progress_viewer::{ProgressViewer, ViewerError};
