use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::controller::{Monitor, SHUTDOWN_GRACE};
use crate::session::SessionBackend;

/// A monitor running on the tokio runtime.
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<B: SessionBackend + 'static> Monitor<B> {
    /// Spawn the polling loop as a background task.
    pub fn spawn(self) -> MonitorHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        MonitorHandle { stop_tx, task }
    }
}

impl MonitorHandle {
    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Raise the stop signal and wait up to `SHUTDOWN_GRACE` for the loop to
    /// exit. A loop still busy after that is aborted. Returns whether it
    /// exited on its own.
    pub async fn shutdown(self) -> bool {
        let MonitorHandle { stop_tx, mut task } = self;
        // Receiver may already be gone if the task ended
        let _ = stop_tx.send(true);

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(())) => {
                info!("Session monitor shut down");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Session monitor task failed");
                false
            }
            Err(_) => {
                warn!("Session monitor did not stop within grace period, aborting");
                task.abort();
                false
            }
        }
    }
}
