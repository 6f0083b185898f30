//! Session polling loop.
//!
//! `Monitor` owns a `SessionBackend` and keeps it logged in: log in when the
//! session is gone, re-check it when it is live, and sleep one of two fixed
//! intervals between cycles. Progress is reported through tracing and an
//! optional `EventSink`.

pub mod controller;
pub mod events;
pub mod handle;
pub mod status;

pub use controller::{Intervals, Monitor, SHUTDOWN_GRACE};
pub use events::{EventSink, MonitorEvent};
pub use handle::MonitorHandle;
pub use status::Status;
