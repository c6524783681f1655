//! Storage Adapters
//!
//! Implementations of the ObjectStorage port for uploaded files and
//! generation context.
//!
//! ## Available Adapters
//!
//! - **HttpObjectStorage** - Talks to the storage HTTP API
//! - **InMemoryObjectStorage** - Stores objects in memory (testing/development)

mod http_object_storage;
mod in_memory_object_storage;

pub use http_object_storage::HttpObjectStorage;
pub use in_memory_object_storage::InMemoryObjectStorage;
