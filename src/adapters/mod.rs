//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `progress` - Event log stores and progress buses (in-memory, Redis)
//! - `generation` - Generation task implementations
//! - `storage` - Object storage clients (HTTP, in-memory)
//! - `http` - Axum REST and WebSocket API

pub mod generation;
pub mod http;
pub mod progress;
pub mod storage;

pub use generation::ScriptedGenerationTask;
pub use progress::{
    InMemoryEventLogStore, InMemoryProgressBus, ProgressKeys, RedisEventLogStore,
    RedisProgressBus,
};
pub use storage::{HttpObjectStorage, InMemoryObjectStorage};
