//! Configuration System
//!
//! Layered runtime configuration for the listener, retry policy and logging.
//! Values come from an optional TOML file with `FOREMAN_*` environment
//! variable overrides on top, and are validated after loading.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForemanConfig {
    /// Listener and queue settings
    #[serde(default)]
    pub listener: ListenerConfig,

    /// Retry policy for the retry error handler
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener and queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Queue buffer capacity (backpressure threshold)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Worker wake interval while the queue is empty (milliseconds); bounds
    /// how quickly a hard stop is observed
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_capacity() -> usize {
    64
}

fn default_poll_interval_ms() -> u64 {
    20
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ListenerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("listener.capacity must be at least 1".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("listener.poll_interval_ms must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts before the retry handler delegates to its fallback
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ForemanConfig {
    /// Load configuration from an optional TOML file plus `FOREMAN_*`
    /// environment overrides (e.g. `FOREMAN_LISTENER__CAPACITY=128`).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("FOREMAN").separator("__"));

        let config: ForemanConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listener.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
