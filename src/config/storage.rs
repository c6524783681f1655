//! External service endpoints

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Storage and inference service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the file storage API
    pub storage_api_url: Option<String>,

    /// Base URL of the inference API
    pub inference_api_url: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_url(self.storage_api_url.as_deref(), "STORAGE__STORAGE_API_URL")?;
        check_url(self.inference_api_url.as_deref(), "STORAGE__INFERENCE_API_URL")?;
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn check_url(url: Option<&str>, name: &'static str) -> Result<(), ValidationError> {
    match url {
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
            Err(ValidationError::InvalidServiceUrl(name))
        }
        _ => Ok(()),
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_api_url: None,
            inference_api_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
