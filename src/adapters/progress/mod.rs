//! Progress adapters - event log stores and progress buses.
//!
//! Two interchangeable backends:
//! - In-memory: single process, used in development and tests
//! - Redis: list-backed logs with TTL plus pub/sub channels, shared across
//!   processes

mod in_memory_bus;
mod in_memory_log;
mod keys;
mod redis_bus;
mod redis_log;

pub use in_memory_bus::InMemoryProgressBus;
pub use in_memory_log::InMemoryEventLogStore;
pub use keys::{ProgressKeys, DEFAULT_KEY_PREFIX};
pub use redis_bus::RedisProgressBus;
pub use redis_log::RedisEventLogStore;
