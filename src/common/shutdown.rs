//! One-shot shutdown signal shared between tasks.

use tokio::sync::watch;

pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender,
        }
    }

    /// Fire the signal. Later calls are no-ops.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal fired, immediately if it already has.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            let _ = receiver.wait_for(|fired| *fired).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_wait_after_shutdown() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_shutdown());

        let wait = shutdown.wait();
        shutdown.shutdown();
        assert!(shutdown.is_shutdown());
        rt.block_on(async { tokio::time::timeout(Duration::from_secs(1), wait).await.unwrap() });

        // a waiter created after the signal resolves at once
        rt.block_on(async { tokio::time::timeout(Duration::from_secs(1), shutdown.wait()).await.unwrap() });
    }
}
