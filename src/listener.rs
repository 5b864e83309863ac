//! Listener: one dedicated worker thread draining a command queue.
//!
//! Lifecycle is `Idle -> Running -> {SoftStopping, HardStopped}`; both stop
//! states are terminal. Soft stop closes the queue and lets the worker drain
//! the buffered tail; hard stop raises the cancellation flag so the worker
//! exits at the next check point, discarding whatever is still buffered. The
//! in-flight command is never interrupted mid-execution in either mode.

use crate::command::Command;
use crate::config::ListenerConfig;
use crate::error::ExecError;
use crate::handler::{ErrorHandler, NoopHandler};
use crate::queue::{CommandQueue, QueueReceiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Listener lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Running,
    SoftStopping,
    HardStopped,
}

/// Owns the queue pair and the single worker thread that drains it.
pub struct Listener {
    queue: Arc<CommandQueue>,
    receiver: Mutex<Option<QueueReceiver>>,
    cancel: Arc<AtomicBool>,
    handler: Mutex<Arc<dyn ErrorHandler>>,
    state: Mutex<ListenerState>,
    worker: Mutex<Option<JoinHandle<()>>>,
    poll_interval: Duration,
}

impl Listener {
    pub fn new(config: &ListenerConfig) -> Self {
        let (queue, receiver) = CommandQueue::bounded(config.capacity);
        Self {
            queue,
            receiver: Mutex::new(Some(receiver)),
            cancel: Arc::new(AtomicBool::new(false)),
            handler: Mutex::new(Arc::new(NoopHandler)),
            state: Mutex::new(ListenerState::Idle),
            worker: Mutex::new(None),
            poll_interval: config.poll_interval(),
        }
    }

    /// Producer-side handle for enqueuing work.
    pub fn queue(&self) -> Arc<CommandQueue> {
        Arc::clone(&self.queue)
    }

    pub fn state(&self) -> ListenerState {
        *self.state.lock()
    }

    /// Install the error handler. Must happen before `start`; the worker
    /// snapshots the handler when it is spawned.
    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        if *self.state.lock() != ListenerState::Idle {
            warn!(
                target: "foreman::listener",
                "error handler set after start has no effect on the running worker"
            );
        }
        *self.handler.lock() = handler;
    }

    /// Spawn the worker thread. Ignored (with a warning) unless the listener
    /// is idle; a stopped listener is not restartable.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if *state != ListenerState::Idle {
            warn!(target: "foreman::listener", state = ?*state, "start ignored, listener not idle");
            return;
        }
        let receiver = match self.receiver.lock().take() {
            Some(receiver) => receiver,
            None => {
                warn!(target: "foreman::listener", "start ignored, receiver already taken");
                return;
            }
        };
        *state = ListenerState::Running;
        drop(state);

        let cancel = Arc::clone(&self.cancel);
        let handler = Arc::clone(&self.handler.lock());
        let poll_interval = self.poll_interval;
        let handle =
            std::thread::spawn(move || run_worker(receiver, cancel, handler, poll_interval));
        *self.worker.lock() = Some(handle);
    }

    /// Graceful shutdown: stop accepting work, drain what was accepted.
    pub fn soft_stop(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                ListenerState::Running => *state = ListenerState::SoftStopping,
                other => {
                    warn!(target: "foreman::listener", state = ?other, "soft stop ignored");
                    return;
                }
            }
        }
        self.queue.close();
        debug!(target: "foreman::listener", "soft stop: queue closed, draining");
    }

    /// Immediate shutdown: the in-flight command finishes, the buffered tail
    /// is discarded unexecuted. Also valid while a soft stop is draining.
    pub fn hard_stop(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                ListenerState::Running | ListenerState::SoftStopping => {
                    *state = ListenerState::HardStopped
                }
                other => {
                    warn!(target: "foreman::listener", state = ?other, "hard stop ignored");
                    return;
                }
            }
        }
        self.queue.close();
        self.cancel.store(true, Ordering::Release);
        debug!(target: "foreman::listener", "hard stop: cancellation signaled");
    }

    /// Wait for the worker thread to exit. No-op if it never started.
    pub fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Deferred `start`, schedulable like ordinary work.
    pub fn start_command(self: &Arc<Self>) -> StartCommand {
        StartCommand {
            listener: Arc::clone(self),
        }
    }

    /// Deferred `soft_stop`.
    pub fn soft_stop_command(self: &Arc<Self>) -> SoftStopCommand {
        SoftStopCommand {
            listener: Arc::clone(self),
        }
    }

    /// Deferred `hard_stop`.
    pub fn hard_stop_command(self: &Arc<Self>) -> HardStopCommand {
        HardStopCommand {
            listener: Arc::clone(self),
        }
    }
}

fn run_worker(
    receiver: QueueReceiver,
    cancel: Arc<AtomicBool>,
    handler: Arc<dyn ErrorHandler>,
    poll_interval: Duration,
) {
    debug!(target: "foreman::listener", "worker started");
    loop {
        if cancel.load(Ordering::Acquire) {
            debug!(target: "foreman::listener", reason = "hard stop", "worker exiting");
            return;
        }
        match receiver.get_timeout(poll_interval) {
            Ok(mut command) => {
                // Re-check after the bounded wait so a command buffered
                // before a hard stop is discarded, not executed.
                if cancel.load(Ordering::Acquire) {
                    debug!(target: "foreman::listener", reason = "hard stop", "worker exiting");
                    return;
                }
                if let Err(error) = command.execute() {
                    handler.handle(command, error);
                }
                // Cancellation is checked between units, never inside one.
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!(target: "foreman::listener", reason = "soft stop", "worker exiting");
                return;
            }
        }
    }
}

/// Queueable wrapper around [`Listener::start`].
pub struct StartCommand {
    listener: Arc<Listener>,
}

impl Command for StartCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        self.listener.start();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "listener-start"
    }
}

/// Queueable wrapper around [`Listener::soft_stop`].
pub struct SoftStopCommand {
    listener: Arc<Listener>,
}

impl Command for SoftStopCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        self.listener.soft_stop();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "listener-soft-stop"
    }
}

/// Queueable wrapper around [`Listener::hard_stop`].
pub struct HardStopCommand {
    listener: Arc<Listener>,
}

impl Command for HardStopCommand {
    fn execute(&mut self) -> Result<(), ExecError> {
        self.listener.hard_stop();
        Ok(())
    }

    fn label(&self) -> &'static str {
        "listener-hard-stop"
    }
}
