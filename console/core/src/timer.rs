//! Scoped Timers
//!
//! A delayed trigger tied to a handle. Dropping the handle aborts the
//! pending task, so a trigger can never outlive the state that armed it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A one-shot trigger that delivers `T` after a delay unless dropped
#[derive(Debug)]
pub struct ScopedTimer {
    handle: JoinHandle<()>,
}

impl ScopedTimer {
    /// Arm a trigger that sends `value` on `tx` after `delay`
    ///
    /// Must be called from within a tokio runtime.
    pub fn after<T: Send + 'static>(
        delay: Duration,
        tx: mpsc::UnboundedSender<T>,
        value: T,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the console shut down
            let _ = tx.send(value);
        });
        Self { handle }
    }

    /// Whether the trigger has already fired (or been aborted)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
