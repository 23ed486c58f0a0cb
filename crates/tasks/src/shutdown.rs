use tokio::sync::watch;

/// Creates a standalone shutdown channel, for tests and tools that don't run
/// a full task manager.
pub fn shutdown_channel() -> (ShutdownSignal, ShutdownGuard) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSignal::new(tx), ShutdownGuard::new(rx))
}

/// Sending half of the process-wide shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Sender<bool>);

impl ShutdownSignal {
    pub(crate) fn new(tx: watch::Sender<bool>) -> Self {
        Self(tx)
    }

    /// Flags every derived [`ShutdownGuard`] to stop.
    pub fn send(&self) {
        let _ = self.0.send(true);
    }
}

/// Per-task view of the shutdown channel. Tasks poll it at their own pace.
#[derive(Debug, Clone)]
pub struct ShutdownGuard(watch::Receiver<bool>);

impl ShutdownGuard {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    /// Whether shutdown has been requested.
    pub fn should_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Suspends until shutdown is requested. A dropped sender counts as a
    /// shutdown request.
    pub async fn wait_for_shutdown(&mut self) {
        let _ = self.0.wait_for(|sig| *sig).await;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_guard_observes_signal() {
        let (tx, rx) = watch::channel(false);
        let signal = ShutdownSignal::new(tx);
        let mut guard = ShutdownGuard::new(rx);

        assert!(!guard.should_shutdown());
        signal.send();
        assert!(guard.should_shutdown());
        // Must complete immediately now that the flag is set.
        guard.wait_for_shutdown().await;
    }

    #[tokio::test]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut guard = ShutdownGuard::new(rx);
        guard.wait_for_shutdown().await;
    }
}
