//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host address")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid progress key prefix: {0}")]
    InvalidKeyPrefix(String),

    #[error("Progress TTL must be at least one second")]
    InvalidTtl,

    #[error("Progress channel capacity must be at least 1")]
    InvalidChannelCapacity,

    #[error("Agent limits must be at least 1")]
    InvalidAgentLimits,

    #[error("Invalid service URL for {0}")]
    InvalidServiceUrl(&'static str),
}
