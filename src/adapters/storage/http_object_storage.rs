//! HTTP client for the file storage service.
//!
//! - Upload: `POST {base}/files?name=<hint>` with the raw bytes as body,
//!   answered by `{ "id": "<file id>" }`
//! - Download: `GET {base}/files/{id}`, answered by the raw bytes

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::ports::{ObjectStorage, StorageError};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

/// Object storage backed by the storage HTTP API.
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    base_url: String,
    client: Client,
}

impl HttpObjectStorage {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    fn network_error(e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Unavailable(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            StorageError::Unavailable(format!("Connection failed: {}", e))
        } else {
            StorageError::Unavailable(e.to_string())
        }
    }

    async fn check_status(response: Response, id: Option<&str>) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(
                id.map(str::to_string).unwrap_or(body),
            )),
            s if s.is_server_error() => Err(StorageError::Unavailable(format!(
                "Server error {}: {}",
                s, body
            ))),
            s => Err(StorageError::InvalidResponse(format!(
                "Unexpected status {}: {}",
                s, body
            ))),
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, name_hint: &str) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.files_url())
            .query(&[("name", name_hint)])
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(Self::network_error)?;

        let response = Self::check_status(response, None).await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(file_id = %uploaded.id, name = name_hint, "Uploaded file");
        Ok(uploaded.id)
    }

    async fn download(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get(format!("{}/{}", self.files_url(), id))
            .send()
            .await
            .map_err(Self::network_error)?;

        let response = Self::check_status(response, Some(id)).await?;
        let bytes = response.bytes().await.map_err(Self::network_error)?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Files = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    async fn upload(
        State(files): State<Files>,
        Query(params): Query<HashMap<String, String>>,
        body: Bytes,
    ) -> Json<Value> {
        let mut files = files.lock().unwrap();
        let id = format!("{}-{}", files.len(), params.get("name").cloned().unwrap_or_default());
        files.insert(id.clone(), body.to_vec());
        Json(json!({ "id": id }))
    }

    async fn download(
        State(files): State<Files>,
        Path(id): Path<String>,
    ) -> Result<Vec<u8>, AxumStatus> {
        files.lock().unwrap().get(&id).cloned().ok_or(AxumStatus::NOT_FOUND)
    }

    async fn serve() -> String {
        let files = Files::default();
        let app = Router::new()
            .route("/files", post(upload))
            .route("/files/:id", get(download))
            .with_state(files);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn upload_then_download_returns_same_bytes() {
        let storage = HttpObjectStorage::new(serve().await, Duration::from_secs(5)).unwrap();

        let id = storage.upload(b"{\"turns\":1}".to_vec(), "context.json").await.unwrap();
        assert_eq!(id, "0-context.json");

        let bytes = storage.download(&id).await.unwrap();
        assert_eq!(bytes, b"{\"turns\":1}");
    }

    #[tokio::test]
    async fn unknown_file_is_not_found() {
        let storage = HttpObjectStorage::new(serve().await, Duration::from_secs(5)).unwrap();

        let err = storage.download("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let storage =
            HttpObjectStorage::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = storage.upload(vec![1, 2, 3], "blob").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let storage = HttpObjectStorage::new("http://files.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(storage.base_url(), "http://files.local");
    }
}
