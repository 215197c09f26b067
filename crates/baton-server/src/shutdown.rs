//! Stop signal for non-blocking servers.
//!
//! Triggering the signal makes the accept loop exit and drop the listening
//! socket. Connections that are already being served are left to finish.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable, trigger-once stop flag that tasks can await.
///
/// # Example
///
/// ```rust
/// use baton_server::StopSignal;
///
/// let stop = StopSignal::new();
/// let other = stop.clone();
///
/// stop.trigger();
/// assert!(other.is_triggered());
/// ```
#[derive(Debug, Clone)]
pub struct StopSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the signal. Calling it again has no further effect.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when the signal is triggered, immediately if it already was.
    pub async fn triggered(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
