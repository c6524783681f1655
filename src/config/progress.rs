//! Progress pipeline configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::progress::DEFAULT_IDLE_TIMEOUT;

use super::error::ValidationError;

/// Where progress logs and live events are kept.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBackend {
    #[default]
    Redis,
    Memory,
}

/// Progress pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Storage and fan-out backend
    #[serde(default)]
    pub backend: ProgressBackend,

    /// Namespace for log keys and channels
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Lifetime of a cycle's log after its last append, in seconds
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How long a relay waits for a live event before probing the viewer
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Per-subscriber buffer of the in-memory bus
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl ProgressConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Validate progress configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_prefix.is_empty() || self.key_prefix.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidKeyPrefix(self.key_prefix.clone()));
        }
        if self.ttl_secs == 0 {
            return Err(ValidationError::InvalidTtl);
        }
        if self.idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        Ok(())
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            backend: ProgressBackend::default(),
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl(),
            idle_timeout_secs: default_idle_timeout(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_key_prefix() -> String {
    "chat2edit:progress:".to_string()
}

fn default_ttl() -> u64 {
    3600
}

fn default_idle_timeout() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_channel_capacity() -> usize {
    256
}
