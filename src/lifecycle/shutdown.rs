//! Shutdown coordination.

use tokio::sync::watch;

/// Cancellation signal shared by the orchestrator, listener binds, and
/// accept loops.
///
/// Cloning shares the same signal. Triggering is one-way: once flipped,
/// the signal never resets.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a fresh, untriggered signal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Trigger the signal. Idempotent.
    pub fn trigger(&self) {
        // send() drops the value when no receiver is subscribed at that
        // moment; send_replace latches it unconditionally.
        self.tx.send_replace(true);
    }

    /// Whether the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal is triggered.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // An error means every sender is gone, which only happens once
        // the owning side has been dropped; treat it as triggered.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_is_observable() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        let observer = shutdown.clone();
        let waiter = tokio::spawn(async move { observer.triggered().await });

        shutdown.trigger();
        assert!(shutdown.is_triggered());
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn trigger_latches_with_no_waiter_subscribed() {
        // Nothing ever subscribes here; the flag must still stick so a
        // later bind attempt sees it.
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());

        let late_observer = shutdown.clone();
        assert!(late_observer.is_triggered());
    }
}
