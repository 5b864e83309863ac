//! Command contract and composition.
//!
//! Everything the queue, listener and scope registry operate on is a
//! [`Command`]: a unit of work that executes once and either succeeds or
//! yields an [`ExecError`]. Commands carry no identity beyond what a concrete
//! implementation captures; whoever holds the box owns the work.

use crate::error::ExecError;
use std::any::Any;

mod wrappers;

pub use wrappers::{tracing_log_fn, LogCommand, LogFn, Retry};

/// A unit of work.
///
/// The `Any` supertrait exists so error handlers can recognize wrapper
/// commands (see [`Retry`]) without the trait growing wrapper-specific hooks.
pub trait Command: Any + Send {
    /// Execute the unit of work.
    fn execute(&mut self) -> Result<(), ExecError>;

    /// Short name used in log emission.
    fn label(&self) -> &'static str {
        "command"
    }
}

/// Owned, type-erased command as stored in queues and scopes.
pub type BoxedCommand = Box<dyn Command>;

/// Adapt a closure into a [`Command`].
pub fn from_fn<F>(f: F) -> FnCommand<F>
where
    F: FnMut() -> Result<(), ExecError> + Send + 'static,
{
    FnCommand { label: "fn", f }
}

/// Closure-backed command, created via [`from_fn`].
pub struct FnCommand<F> {
    label: &'static str,
    f: F,
}

impl<F> FnCommand<F> {
    /// Override the label reported to log emission.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

impl<F> Command for FnCommand<F>
where
    F: FnMut() -> Result<(), ExecError> + Send + 'static,
{
    fn execute(&mut self) -> Result<(), ExecError> {
        (self.f)()
    }

    fn label(&self) -> &'static str {
        self.label
    }
}

/// Sequential composite command.
///
/// Executes its steps in order and stops at the first failure, propagating
/// that failure verbatim. Steps after a failed one are never executed.
pub struct Sequence {
    steps: Vec<BoxedCommand>,
}

impl Sequence {
    pub fn new(steps: Vec<BoxedCommand>) -> Self {
        Self { steps }
    }

    pub fn push(&mut self, step: BoxedCommand) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Command for Sequence {
    fn execute(&mut self) -> Result<(), ExecError> {
        for step in &mut self.steps {
            step.execute()?;
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        "sequence"
    }
}
