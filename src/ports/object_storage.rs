//! ObjectStorage port - Upload and download of opaque file blobs.
//!
//! Used by the surrounding generation code for attachments and saved
//! context; identifiers are assigned by the storage service.

use async_trait::async_trait;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),
}

/// Port for the object storage service.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` and return the assigned identifier.
    async fn upload(&self, bytes: Vec<u8>, name_hint: &str) -> Result<String, StorageError>;

    /// Fetch the bytes stored under `id`.
    async fn download(&self, id: &str) -> Result<Vec<u8>, StorageError>;
}
