//! Bounded command queue with an explicit end-of-stream signal.
//!
//! Decouples producers of work from the single consuming worker. The buffer
//! is a `sync_channel`, so `put` applies backpressure at capacity, and
//! closing drops the sender: once every in-flight `put` finishes, the
//! receiver observes end-of-stream after draining exactly the commands that
//! were buffered at the moment of closing.

use crate::command::BoxedCommand;
use parking_lot::Mutex;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Producer-side handle to the bounded FIFO buffer.
///
/// Cheap to share behind an `Arc`; any number of threads may `put`
/// concurrently. Closing is a one-way transition.
pub struct CommandQueue {
    sender: Mutex<Option<SyncSender<BoxedCommand>>>,
}

impl CommandQueue {
    /// Create a queue with the given buffer capacity together with its
    /// single consumer end.
    pub fn bounded(capacity: usize) -> (Arc<CommandQueue>, QueueReceiver) {
        let (sender, receiver) = sync_channel(capacity);
        let queue = Arc::new(CommandQueue {
            sender: Mutex::new(Some(sender)),
        });
        (queue, QueueReceiver { receiver })
    }

    /// Enqueue a command.
    ///
    /// Blocks briefly when the buffer is at capacity. Once the queue has been
    /// closed the command is silently dropped, matching the behavior of a
    /// listener that already stopped.
    pub fn put(&self, command: BoxedCommand) {
        // Clone the sender out of the lock so a blocking send never holds it;
        // a racing close() either beats the clone (drop) or the command lands
        // in the buffer before end-of-stream is observable.
        let sender = self.sender.lock().clone();
        match sender {
            Some(sender) => {
                // Err only when the worker side is gone; equivalent to closed.
                let _ = sender.send(command);
            }
            None => {
                debug!(target: "foreman::queue", "queue closed, dropping command");
            }
        }
    }

    /// Close the queue for further enqueue. Idempotent. Commands already
    /// buffered remain consumable until drained.
    pub fn close(&self) {
        self.sender.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

/// Consumer side of a [`CommandQueue`]. Owned by the listener worker.
pub struct QueueReceiver {
    receiver: Receiver<BoxedCommand>,
}

impl QueueReceiver {
    /// Block until a command is available or the queue is closed and drained.
    /// `None` signals that no more commands will ever arrive.
    pub fn get(&self) -> Option<BoxedCommand> {
        self.receiver.recv().ok()
    }

    /// Bounded wait, used by the worker loop so cancellation is observed
    /// promptly even while the buffer is empty.
    pub(crate) fn get_timeout(
        &self,
        timeout: Duration,
    ) -> Result<BoxedCommand, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
