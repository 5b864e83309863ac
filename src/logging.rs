//! Logging System
//!
//! Structured logging via the `tracing` crate: configurable level, text or
//! JSON output, and per-module level overrides. The `FOREMAN_LOG` environment
//! variable takes precedence over configured levels.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(format!("unknown log level '{}'", self.level));
        }
        if !matches!(self.format.as_str(), "text" | "json") {
            return Err(format!("unknown log format '{}'", self.format));
        }
        for (module, level) in &self.modules {
            if !LEVELS.contains(&level.as_str()) {
                return Err(format!("unknown log level '{level}' for module '{module}'"));
            }
        }
        Ok(())
    }
}

/// Initialize the logging system.
///
/// Priority order (highest to lowest): `FOREMAN_LOG` environment variable,
/// the supplied configuration, defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ConfigError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);
    config
        .validate()
        .map_err(ConfigError::Invalid)?;

    let filter = build_env_filter(config)?;
    let registry = Registry::default().with(filter);

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string())),
        _ => registry
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color),
            )
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string())),
    }
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(spec) = std::env::var("FOREMAN_LOG") {
        if !spec.is_empty() {
            return EnvFilter::try_new(&spec).map_err(|e| ConfigError::Logging(e.to_string()));
        }
    }

    let mut directives = vec![config.level.clone()];
    for (module, level) in &config.modules {
        directives.push(format!("{module}={level}"));
    }
    EnvFilter::try_new(directives.join(",")).map_err(|e| ConfigError::Logging(e.to_string()))
}
