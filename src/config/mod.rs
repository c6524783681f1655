//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `CHAT2EDIT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use chat2edit::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod error;
mod generation;
mod progress;
mod redis;
mod server;
mod storage;

pub use error::{ConfigError, ValidationError};
pub use generation::GenerationConfig;
pub use progress::{ProgressBackend, ProgressConfig};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis connection (progress logs and pub/sub)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Progress pipeline settings
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Generation defaults and provider keys
    #[serde(default)]
    pub generation: GenerationConfig,

    /// External storage and inference services
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CHAT2EDIT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CHAT2EDIT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHAT2EDIT__PROGRESS__TTL_SECS=600` -> `progress.ttl_secs = 600`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHAT2EDIT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Redis settings are only checked when Redis is the progress backend.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.progress.validate()?;
        if self.progress.backend == ProgressBackend::Redis {
            self.redis.validate()?;
        }
        self.generation.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "CHAT2EDIT__REDIS__URL",
        "CHAT2EDIT__SERVER__PORT",
        "CHAT2EDIT__SERVER__ENVIRONMENT",
        "CHAT2EDIT__PROGRESS__BACKEND",
        "CHAT2EDIT__PROGRESS__TTL_SECS",
        "CHAT2EDIT__GENERATION__OPENAI_API_KEY",
        "CHAT2EDIT__GENERATION__PROVIDER",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CHAT2EDIT__REDIS__URL", "redis://localhost:6379");
        env::set_var("CHAT2EDIT__PROGRESS__TTL_SECS", "600");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.progress.ttl_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.progress.backend, ProgressBackend::Redis);
        assert_eq!(config.generation.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_memory_backend_needs_no_redis() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CHAT2EDIT__PROGRESS__BACKEND", "memory");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.progress.backend, ProgressBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CHAT2EDIT__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_server_port_and_provider() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("CHAT2EDIT__SERVER__PORT", "3000");
        env::set_var("CHAT2EDIT__GENERATION__PROVIDER", "google");
        env::set_var("CHAT2EDIT__GENERATION__OPENAI_API_KEY", "sk-test");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.generation.provider,
            crate::domain::generation::LlmProvider::Google
        );
        assert!(config.generation.openai_api_key.is_some());
    }
}
