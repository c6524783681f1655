//! In-memory object storage for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ports::{ObjectStorage, StorageError};

/// In-memory object storage.
///
/// Ids are `<uuid>-<name hint>`, so uploads never collide.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStorage {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects (for testing).
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, name_hint: &str) -> Result<String, StorageError> {
        let id = format!("{}-{}", Uuid::new_v4(), name_hint);
        self.objects.write().await.insert(id.clone(), bytes);
        Ok(id)
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_and_download() {
        let storage = InMemoryObjectStorage::new();

        let id = storage.upload(vec![1, 2, 3], "image.fig.json").await.unwrap();

        assert!(id.ends_with("-image.fig.json"));
        assert_eq!(storage.download(&id).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn uploads_get_distinct_ids() {
        let storage = InMemoryObjectStorage::new();

        let a = storage.upload(vec![1], "x").await.unwrap();
        let b = storage.upload(vec![1], "x").await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn download_missing_returns_not_found() {
        let storage = InMemoryObjectStorage::new();
        assert!(storage.is_empty().await);

        let err = storage.download("missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
