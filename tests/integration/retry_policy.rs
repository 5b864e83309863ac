//! Integration tests for the retry error-handling chain
//!
//! Tests cover:
//! - Retry-then-log: a persistently failing command is re-run up to the
//!   attempt cap, then its failure is reported through the fallback
//! - A transient failure that recovers within the cap produces no report

use foreman::command::{from_fn, LogFn};
use foreman::config::ListenerConfig;
use foreman::error::ExecError;
use foreman::handler::{LogHandler, RetryHandler};
use foreman::listener::Listener;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn retrying_listener(max_attempts: u32, sink: LogFn) -> Arc<Listener> {
    let listener = Arc::new(Listener::new(&ListenerConfig {
        capacity: 8,
        poll_interval_ms: 5,
    }));
    let fallback = Arc::new(LogHandler::with_log_fn(listener.queue(), sink));
    listener.set_error_handler(Arc::new(RetryHandler::new(
        listener.queue(),
        max_attempts,
        fallback,
    )));
    listener
}

#[test]
fn persistent_failure_is_retried_then_logged() {
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let (logged_tx, logged_rx) = mpsc::channel();
    let sink: LogFn = {
        let messages = Arc::clone(&messages);
        Arc::new(move |message| {
            messages.lock().push(message.to_string());
            logged_tx.send(()).unwrap();
        })
    };

    let listener = retrying_listener(2, sink);
    let executions = Arc::new(AtomicUsize::new(0));

    {
        let executions = Arc::clone(&executions);
        listener.queue().put(Box::new(
            from_fn(move || {
                executions.fetch_add(1, Ordering::SeqCst);
                Err(ExecError::failed("engine stalled"))
            })
            .with_label("move"),
        ));
    }
    listener.start();

    logged_rx.recv_timeout(WAIT).unwrap();
    listener.soft_stop();
    listener.join();

    // Initial run plus two retries, then a single report.
    assert_eq!(executions.load(Ordering::SeqCst), 3);
    assert_eq!(
        messages.lock().as_slice(),
        ["move failed: engine stalled".to_string()]
    );
}

#[test]
fn transient_failure_recovers_without_a_report() {
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink: LogFn = {
        let messages = Arc::clone(&messages);
        Arc::new(move |message| messages.lock().push(message.to_string()))
    };

    let listener = retrying_listener(3, sink);
    let executions = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    {
        let executions = Arc::clone(&executions);
        listener.queue().put(Box::new(
            from_fn(move || {
                // Fails twice, succeeds on the third run.
                if executions.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(ExecError::failed("not ready"));
                }
                done_tx.send(()).unwrap();
                Ok(())
            })
            .with_label("warmup"),
        ));
    }
    listener.start();

    done_rx.recv_timeout(WAIT).unwrap();
    listener.soft_stop();
    listener.join();

    assert_eq!(executions.load(Ordering::SeqCst), 3);
    assert!(messages.lock().is_empty());
}
