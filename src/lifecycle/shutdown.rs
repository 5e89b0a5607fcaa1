//! Shutdown coordination for the relay.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// How long open streams may keep running once shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for `task` to finish, giving up after `deadline`.
///
/// Returns `None` when the deadline passed; long media streams are the usual cause.
pub async fn drain<F: Future>(task: F, deadline: Duration) -> Option<F::Output> {
    match tokio::time::timeout(deadline, task).await {
        Ok(output) => Some(output),
        Err(_) => {
            tracing::warn!(deadline = ?deadline, "Drain deadline passed, dropping open streams");
            None
        }
    }
}
