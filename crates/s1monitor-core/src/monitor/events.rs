use chrono::{DateTime, Local};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use super::Status;

/// Messages from the polling loop to whoever is presenting it.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// One line of narration
    Log { at: DateTime<Local>, message: String },
    /// Status changed; `authenticated` is the session client's cached flag
    Status {
        at: DateTime<Local>,
        status: Status,
        authenticated: bool,
    },
}

/// Non-blocking outlet for `MonitorEvent`s.
///
/// Sends never wait: a full or closed channel drops the event.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<MonitorEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<MonitorEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that discards everything. Tracing still gets the narration.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, event: MonitorEvent) {
        let Some(ref tx) = self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Monitor event channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                // Presentation has gone away; the loop keeps running regardless
            }
        }
    }
}
