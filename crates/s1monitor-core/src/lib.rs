//! Core library for s1monitor.
//!
//! Keeps a Stage1st forum account logged in:
//!
//! - `session`: HTTP session client that logs in and validates the session
//! - `monitor`: the polling loop that drives the client and reports status
//! - `config`: YAML configuration loading
//! - `lock`: single-instance file lock

pub mod config;
pub mod lock;
pub mod monitor;
pub mod session;

pub use config::{Config, ConfigError};
pub use lock::{InstanceLock, LockError};
pub use monitor::{EventSink, Intervals, Monitor, MonitorEvent, MonitorHandle, Status};
pub use session::{Credentials, SessionBackend, SessionClient, SessionError};
