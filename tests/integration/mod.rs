//! Integration test modules

mod listener_lifecycle;
mod retry_policy;
