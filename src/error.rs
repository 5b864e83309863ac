//! Error types for the Foreman command registry and queue.

use thiserror::Error;

/// Failure produced by executing a command.
///
/// Queued command failures never propagate past the listener boundary; the
/// worker routes them to the configured error handler. `ScopeNotFound` is the
/// only error the scope registry itself produces (switching to an unknown
/// scope without permission to create it).
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no such scope: {0}")]
    ScopeNotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExecError {
    /// Convenience constructor for plain-message failures.
    pub fn failed(message: impl Into<String>) -> Self {
        ExecError::Failed(message.into())
    }
}

/// Assertion failure on a resolved value.
///
/// Producers yield one of a small closed set of shapes; asking a resolved
/// value for the wrong one is a programming error at the call site, reported
/// with both shapes named.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("resolved value has unsupported shape: expected {expected}, got {actual}")]
    UnsupportedShape {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("logging setup error: {0}")]
    Logging(String),
}
