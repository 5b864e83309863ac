//! Error handlers invoked by the listener worker.
//!
//! A failing command never stops the worker; the worker hands the command
//! and its failure to one of these handlers synchronously. Handlers that
//! re-enqueue (log, retry) go through the same queue as ordinary work, so
//! recovery actions are scheduled uniformly with everything else.

use crate::command::{BoxedCommand, LogCommand, LogFn, Retry};
use crate::error::ExecError;
use crate::queue::CommandQueue;
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

/// Receives a failed command together with its failure.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, command: BoxedCommand, error: ExecError);
}

/// Default handler: drops the pair. Used when no handler is configured.
pub struct NoopHandler;

impl ErrorHandler for NoopHandler {
    fn handle(&self, command: BoxedCommand, error: ExecError) {
        trace!(
            target: "foreman::handler",
            command = command.label(),
            error = %error,
            "dropping failure, no handler configured"
        );
    }
}

/// Terminal handler: enqueues a [`LogCommand`] for the failure.
pub struct LogHandler {
    queue: Arc<CommandQueue>,
    log_fn: LogFn,
}

impl LogHandler {
    pub fn new(queue: Arc<CommandQueue>) -> Self {
        Self::with_log_fn(queue, crate::command::tracing_log_fn())
    }

    /// Use a custom log sink instead of `tracing`.
    pub fn with_log_fn(queue: Arc<CommandQueue>, log_fn: LogFn) -> Self {
        Self { queue, log_fn }
    }
}

impl ErrorHandler for LogHandler {
    fn handle(&self, command: BoxedCommand, error: ExecError) {
        self.queue
            .put(Box::new(LogCommand::new(command, error, self.log_fn.clone())));
    }
}

/// Re-enqueues failed commands up to an attempt cap, then delegates the
/// original command and failure to a fallback handler.
pub struct RetryHandler {
    queue: Arc<CommandQueue>,
    max_attempts: u32,
    fallback: Arc<dyn ErrorHandler>,
}

impl RetryHandler {
    pub fn new(queue: Arc<CommandQueue>, max_attempts: u32, fallback: Arc<dyn ErrorHandler>) -> Self {
        Self {
            queue,
            max_attempts,
            fallback,
        }
    }
}

impl ErrorHandler for RetryHandler {
    fn handle(&self, command: BoxedCommand, error: ExecError) {
        // First failure of a plain command: wrap and re-enqueue.
        if (command.as_ref() as &dyn Any).downcast_ref::<Retry>().is_none() {
            self.queue.put(Box::new(Retry::first(command)));
            return;
        }

        let any: Box<dyn Any> = command;
        let Ok(retry) = any.downcast::<Retry>() else {
            return;
        };
        let mut retry = *retry;

        if retry.attempt() >= self.max_attempts {
            self.fallback.handle(retry.into_inner(), error);
            return;
        }

        retry.bump();
        self.queue.put(Box::new(retry));
    }
}
