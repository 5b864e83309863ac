//! Integration tests for the listener lifecycle
//!
//! Tests cover:
//! - Worker startup and asynchronous execution
//! - Soft stop: drain accepted work, drop later puts
//! - Hard stop: in-flight command completes, buffered tail is discarded
//! - FIFO execution order through the worker

use foreman::command::{from_fn, BoxedCommand, Command};
use foreman::config::ListenerConfig;
use foreman::listener::{Listener, ListenerState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn test_listener() -> Arc<Listener> {
    Arc::new(Listener::new(&ListenerConfig {
        capacity: 8,
        poll_interval_ms: 5,
    }))
}

/// A command that signals when it starts executing, then blocks until
/// released. Returns (command, started receiver, release sender).
fn gated_command() -> (BoxedCommand, mpsc::Receiver<()>, mpsc::Sender<()>) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let command: BoxedCommand = Box::new(from_fn(move || {
        started_tx.send(()).unwrap();
        release_rx.recv().unwrap();
        Ok(())
    }));
    (command, started_rx, release_tx)
}

fn flag_command(flag: Arc<AtomicBool>, done: mpsc::Sender<()>) -> BoxedCommand {
    Box::new(from_fn(move || {
        flag.store(true, Ordering::SeqCst);
        done.send(()).unwrap();
        Ok(())
    }))
}

#[test]
fn queued_work_only_runs_after_start() {
    let listener = test_listener();
    let queue = listener.queue();
    let (done_tx, done_rx) = mpsc::channel();
    let flag = Arc::new(AtomicBool::new(false));

    queue.put(flag_command(Arc::clone(&flag), done_tx));
    assert!(!flag.load(Ordering::SeqCst));

    listener.start_command().execute().unwrap();
    done_rx.recv_timeout(WAIT).unwrap();
    assert!(flag.load(Ordering::SeqCst));
    assert_eq!(listener.state(), ListenerState::Running);

    listener.soft_stop();
    listener.join();
}

#[test]
fn soft_stop_drains_accepted_work_and_drops_later_puts() {
    let listener = test_listener();
    let queue = listener.queue();

    let (blocker, started_rx, release_tx) = gated_command();
    let flag2 = Arc::new(AtomicBool::new(false));
    let (done2_tx, done2_rx) = mpsc::channel();

    listener.start_command().execute().unwrap();
    queue.put(blocker);
    started_rx.recv_timeout(WAIT).unwrap();

    // Buffered behind the in-flight command, accepted before the stop.
    queue.put(flag_command(Arc::clone(&flag2), done2_tx));

    listener.soft_stop_command().execute().unwrap();
    assert!(queue.is_closed());

    // Accepted after the stop: silently dropped.
    let flag3 = Arc::new(AtomicBool::new(false));
    let (done3_tx, _done3_rx) = mpsc::channel();
    queue.put(flag_command(Arc::clone(&flag3), done3_tx));

    release_tx.send(()).unwrap();
    done2_rx.recv_timeout(WAIT).unwrap();
    listener.join();

    assert!(flag2.load(Ordering::SeqCst));
    assert!(!flag3.load(Ordering::SeqCst));
    assert_eq!(listener.state(), ListenerState::SoftStopping);
}

#[test]
fn hard_stop_discards_buffered_tail_but_finishes_in_flight() {
    let listener = test_listener();
    let queue = listener.queue();

    let (blocker, started_rx, release_tx) = gated_command();
    let flag2 = Arc::new(AtomicBool::new(false));
    let (done2_tx, _done2_rx) = mpsc::channel();

    listener.start_command().execute().unwrap();
    queue.put(blocker);
    started_rx.recv_timeout(WAIT).unwrap();

    queue.put(flag_command(Arc::clone(&flag2), done2_tx));

    listener.hard_stop_command().execute().unwrap();
    assert_eq!(listener.state(), ListenerState::HardStopped);

    // The in-flight command is not interrupted; it finishes after the stop.
    release_tx.send(()).unwrap();
    listener.join();

    assert!(!flag2.load(Ordering::SeqCst));
}

#[test]
fn commands_execute_in_enqueue_order() {
    let listener = test_listener();
    let queue = listener.queue();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let order = Arc::clone(&order);
        queue.put(Box::new(from_fn(move || {
            order.lock().push(i);
            Ok(())
        })));
    }

    listener.start();
    listener.soft_stop();
    listener.join();

    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn failing_command_does_not_stop_the_worker() {
    let listener = test_listener();
    let queue = listener.queue();
    let (done_tx, done_rx) = mpsc::channel();
    let flag = Arc::new(AtomicBool::new(false));

    queue.put(Box::new(from_fn(|| {
        Err(foreman::error::ExecError::failed("deliberate"))
    })));
    queue.put(flag_command(Arc::clone(&flag), done_tx));

    listener.start();
    done_rx.recv_timeout(WAIT).unwrap();
    assert!(flag.load(Ordering::SeqCst));

    listener.soft_stop();
    listener.join();
}
