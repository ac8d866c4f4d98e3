//! Single-consumer event mailbox.
//!
//! Any thread may enqueue events; the owner context drains and handles them
//! strictly in enqueue order, never concurrently with itself. This is the
//! only path by which background work (model loading, capture callbacks,
//! transcription workers, timers) may reach session state.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use crate::event::SessionEvent;

/// Cloneable enqueue handle for the session mailbox.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Dispatcher {
    /// Create a mailbox. The receiver belongs to the owner context.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue an event. A send after the owner loop has exited is dropped.
    pub fn send(&self, event: SessionEvent) {
        trace!(event = ?event, "Dispatch");
        let _ = self.tx.send(event);
    }

    /// Enqueue an event after `delay`, relative to the owner's clock.
    ///
    /// The timer runs as a background task; the event still arrives through
    /// the same serialized mailbox, so it composes with directly enqueued
    /// events without extra locking.
    pub fn send_after(&self, delay: Duration, event: SessionEvent) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(event = ?event, "Dispatch (delayed)");
            let _ = tx.send(event);
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
