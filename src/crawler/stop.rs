//! External stop signal for a running crawl

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle that asks a running scheduler to stop
///
/// Stopping is sticky: once raised the signal stays raised. The scheduler stops
/// dispatching, gives in-flight fetches the shutdown grace period, then
/// discards whatever is still outstanding.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Raises `stop` on the first Ctrl+C
pub fn stop_on_ctrl_c(stop: StopHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, stopping crawl after in-flight fetches");
            stop.stop();
        }
    });
}
