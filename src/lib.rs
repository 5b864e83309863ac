//! Foreman: Scoped Command Registry and Asynchronous Command Queue
//!
//! Units of work ([`command::Command`]) are resolved by name through a
//! hierarchy of scopes bound per logical thread of control, enqueued onto a
//! bounded queue, and drained by a dedicated listener worker that supports
//! graceful (drain) and immediate (abort) shutdown.

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod listener;
pub mod logging;
pub mod queue;
pub mod scope;
