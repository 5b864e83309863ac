//! Decorator commands consumed by the error-handler layer.

use super::{BoxedCommand, Command};
use crate::error::ExecError;
use std::sync::Arc;
use tracing::error;

/// Log sink invoked by [`LogCommand`]. Injectable so tests can capture
/// emission; production code uses [`tracing_log_fn`].
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Default log sink: routes messages through `tracing` at error level.
pub fn tracing_log_fn() -> LogFn {
    Arc::new(|message| error!(target: "foreman::command", "{message}"))
}

/// Converts a failed command and its error into a log emission.
///
/// Always succeeds itself, which makes it safe as the terminal step of any
/// error-handling chain.
pub struct LogCommand {
    failed: BoxedCommand,
    error: ExecError,
    log_fn: LogFn,
}

impl LogCommand {
    pub fn new(failed: BoxedCommand, error: ExecError, log_fn: LogFn) -> Self {
        Self {
            failed,
            error,
            log_fn,
        }
    }
}

impl Command for LogCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        let message = format!("{} failed: {}", self.failed.label(), self.error);
        (self.log_fn)(&message);
        Ok(())
    }

    fn label(&self) -> &'static str {
        "log"
    }
}

/// Wraps a command with an attempt counter for re-enqueue on failure.
///
/// Executing a `Retry` just delegates to the inner command; the counter is
/// advanced by the retry error handler, never by execution itself.
pub struct Retry {
    inner: BoxedCommand,
    attempt: u32,
}

impl Retry {
    /// Wrap a command after its first failure.
    pub fn first(inner: BoxedCommand) -> Self {
        Self { inner, attempt: 1 }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn bump(&mut self) {
        self.attempt += 1;
    }

    /// Unwrap the original command, e.g. to hand it to a fallback handler.
    pub fn into_inner(self) -> BoxedCommand {
        self.inner
    }
}

impl Command for Retry {
    fn execute(&mut self) -> Result<(), ExecError> {
        self.inner.execute()
    }

    fn label(&self) -> &'static str {
        self.inner.label()
    }
}
