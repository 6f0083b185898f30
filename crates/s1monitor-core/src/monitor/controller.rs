//! The polling controller.
//!
//! One cycle is either a login attempt (when the backend reports no session)
//! or a session check (when it does). The outcome picks the sleep:
//! `Intervals::steady` after success, `Intervals::retry` after anything else.
//!
//! Shutdown is cooperative. The stop signal is checked at the top of every
//! cycle and raced against the sleep, but an in-flight request is never
//! interrupted, so a stop can take up to one request timeout to be observed.
//! Callers should give the task `SHUTDOWN_GRACE` after signalling.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{EventSink, MonitorEvent, Status};
use crate::session::SessionBackend;

// ============================================================================
// Constants
// ============================================================================

/// Sleep after a successful login or session check.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Sleep after a failed login or an invalid session.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;

/// How long to wait for the loop to notice a stop signal before giving up on it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Narration used when the login request went through but no session appeared.
const LOGIN_NOT_CONFIRMED: &str = "login succeeded but validation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub steady: Duration,
    pub retry: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            steady: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            retry: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

pub struct Monitor<B> {
    backend: B,
    username: String,
    intervals: Intervals,
    status: Status,
    events: EventSink,
}

impl<B: SessionBackend> Monitor<B> {
    pub fn new(
        backend: B,
        username: impl Into<String>,
        intervals: Intervals,
        events: EventSink,
    ) -> Self {
        Self {
            backend,
            username: username.into(),
            intervals,
            status: Status::Initializing,
            events,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    #[cfg(test)]
    fn backend(&self) -> &B {
        &self.backend
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.narrate("Session monitor started".to_string());
        self.narrate(format!("Username: {}", self.username));
        self.narrate(format!(
            "Check interval: {} seconds",
            self.intervals.steady.as_secs()
        ));
        self.set_status(Status::Initializing);

        loop {
            // A dropped sender counts as a stop
            if *shutdown.borrow() || shutdown.has_changed().is_err() {
                break;
            }

            let pause = self.step().await;

            let stopped = tokio::select! {
                _ = tokio::time::sleep(pause) => false,
                changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
            };
            if stopped {
                break;
            }
        }

        self.narrate("Session monitor stopped".to_string());
    }

    /// Run one cycle and return how long to sleep before the next.
    pub async fn step(&mut self) -> Duration {
        if self.backend.is_authenticated() {
            self.check_session().await
        } else {
            self.log_in().await
        }
    }

    async fn log_in(&mut self) -> Duration {
        self.set_status(Status::LoggingIn);
        self.narrate(format!("Logging in as {}...", self.username));

        let result = self.backend.authenticate().await;
        if result.is_ok() && self.backend.is_authenticated() {
            self.set_status(Status::LoginSucceeded);
            self.narrate("Login succeeded, keeping session alive".to_string());
            return self.intervals.steady;
        }

        self.set_status(Status::LoginFailed);
        let reason = match result {
            Err(e) => e.to_string(),
            Ok(()) => LOGIN_NOT_CONFIRMED.to_string(),
        };
        warn!(user = %self.username, reason = %reason, "Login failed");
        self.narrate(format!("Login failed: {}", reason));
        self.narrate(format!(
            "Retrying in {} seconds...",
            self.intervals.retry.as_secs()
        ));
        self.intervals.retry
    }

    async fn check_session(&mut self) -> Duration {
        self.narrate("Checking session...".to_string());

        let valid = match self.backend.validate().await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Session check failed");
                self.narrate(format!("Session check error: {}", e));
                false
            }
        };

        if valid {
            self.set_status(Status::SessionValid);
            self.narrate("Session valid, idling".to_string());
            self.intervals.steady
        } else {
            self.set_status(Status::SessionInvalid);
            self.narrate("Session invalid, will log in again".to_string());
            self.intervals.retry
        }
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
        let authenticated = self.backend.is_authenticated();
        debug!(status = %status, authenticated, "Status changed");
        self.events.send(MonitorEvent::Status {
            at: Local::now(),
            status,
            authenticated,
        });
        self.narrate(format!("Status: {}", status));
    }

    fn narrate(&self, message: String) {
        info!("{}", message);
        self.events.send(MonitorEvent::Log {
            at: Local::now(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    use crate::session::SessionError;

    // -------------------------------------------------------------------------
    // Scripted backend
    // -------------------------------------------------------------------------

    /// What the next network call should produce.
    #[derive(Clone, Copy)]
    enum Reply {
        /// authenticate: transport failure
        LoginError,
        /// authenticate: request accepted, follow-up check answers this
        LoginThenCheck(bool),
        /// validate: answers this
        Check(bool),
        /// validate: transport failure
        CheckError,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Authenticate,
        Validate,
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<(Call, Instant)>,
        in_flight: bool,
        overlapped: bool,
    }

    struct FakeBackend {
        replies: VecDeque<Reply>,
        /// Used once the script runs out
        fallback: Reply,
        authenticated: bool,
        log: Arc<Mutex<Log>>,
    }

    impl FakeBackend {
        fn new(replies: Vec<Reply>, fallback: Reply) -> (Self, Arc<Mutex<Log>>) {
            let log = Arc::new(Mutex::new(Log::default()));
            let backend = Self {
                replies: replies.into(),
                fallback,
                authenticated: false,
                log: log.clone(),
            };
            (backend, log)
        }

        fn next_reply(&mut self) -> Reply {
            self.replies.pop_front().unwrap_or(self.fallback)
        }

        async fn call(&mut self, call: Call) -> Reply {
            {
                let mut log = self.log.lock().unwrap();
                if log.in_flight {
                    log.overlapped = true;
                }
                log.in_flight = true;
                log.calls.push((call, Instant::now()));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.log.lock().unwrap().in_flight = false;
            self.next_reply()
        }
    }

    #[async_trait]
    impl SessionBackend for FakeBackend {
        async fn authenticate(&mut self) -> Result<(), SessionError> {
            match self.call(Call::Authenticate).await {
                Reply::LoginThenCheck(valid) => {
                    self.authenticated = valid;
                    Ok(())
                }
                _ => {
                    self.authenticated = false;
                    Err(SessionError::ServerError(500))
                }
            }
        }

        async fn validate(&mut self) -> Result<bool, SessionError> {
            match self.call(Call::Validate).await {
                Reply::Check(valid) => {
                    self.authenticated = valid;
                    Ok(valid)
                }
                _ => {
                    self.authenticated = false;
                    Err(SessionError::RateLimited)
                }
            }
        }

        fn is_authenticated(&self) -> bool {
            self.authenticated
        }
    }

    fn test_intervals() -> Intervals {
        Intervals {
            steady: Duration::from_secs(60),
            retry: Duration::from_secs(10),
        }
    }

    fn monitor(backend: FakeBackend) -> (Monitor<FakeBackend>, mpsc::Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let monitor = Monitor::new(backend, "alice", test_intervals(), EventSink::new(tx));
        (monitor, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<MonitorEvent>) -> (Vec<Status>, Vec<String>) {
        let mut statuses = Vec::new();
        let mut lines = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                MonitorEvent::Status { status, .. } => statuses.push(status),
                MonitorEvent::Log { message, .. } => lines.push(message),
            }
        }
        (statuses, lines)
    }

    // -------------------------------------------------------------------------
    // Single cycles
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_initial_status() {
        let (backend, _) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, _rx) = monitor(backend);
        assert_eq!(monitor.status(), Status::Initializing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_success_uses_steady_interval() {
        let (backend, log) =
            FakeBackend::new(vec![Reply::LoginThenCheck(true)], Reply::Check(true));
        let (mut monitor, mut rx) = monitor(backend);

        let pause = monitor.step().await;

        assert_eq!(pause, Duration::from_secs(60));
        assert_eq!(monitor.status(), Status::LoginSucceeded);
        assert!(monitor.backend().is_authenticated());
        let (statuses, _) = drain(&mut rx);
        assert_eq!(statuses, vec![Status::LoggingIn, Status::LoginSucceeded]);
        assert_eq!(log.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_valid() {
        let (backend, _) = FakeBackend::new(
            vec![Reply::LoginThenCheck(true), Reply::Check(true)],
            Reply::Check(true),
        );
        let (mut monitor, mut rx) = monitor(backend);
        monitor.step().await;
        drain(&mut rx);

        let pause = monitor.step().await;

        assert_eq!(pause, Duration::from_secs(60));
        assert_eq!(monitor.status(), Status::SessionValid);
        let (statuses, _) = drain(&mut rx);
        assert_eq!(statuses, vec![Status::SessionValid]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_invalid_triggers_login_next_cycle() {
        let (backend, log) = FakeBackend::new(
            vec![
                Reply::LoginThenCheck(true),
                Reply::Check(false),
                Reply::LoginThenCheck(true),
            ],
            Reply::Check(true),
        );
        let (mut monitor, mut rx) = monitor(backend);
        monitor.step().await;
        drain(&mut rx);

        let pause = monitor.step().await;
        assert_eq!(pause, Duration::from_secs(10));
        assert_eq!(monitor.status(), Status::SessionInvalid);
        assert!(!monitor.backend().is_authenticated());

        monitor.step().await;
        let calls: Vec<Call> = log.lock().unwrap().calls.iter().map(|(c, _)| *c).collect();
        assert_eq!(calls, vec![Call::Authenticate, Call::Validate, Call::Authenticate]);
        let (statuses, _) = drain(&mut rx);
        assert_eq!(
            statuses,
            vec![Status::SessionInvalid, Status::LoggingIn, Status::LoginSucceeded]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_error_uses_retry_interval() {
        let (backend, log) = FakeBackend::new(vec![Reply::LoginError], Reply::LoginError);
        let (mut monitor, mut rx) = monitor(backend);

        let pause = monitor.step().await;

        assert_eq!(pause, Duration::from_secs(10));
        assert_eq!(monitor.status(), Status::LoginFailed);
        assert!(!monitor.backend().is_authenticated());
        let (statuses, lines) = drain(&mut rx);
        assert_eq!(statuses, vec![Status::LoggingIn, Status::LoginFailed]);
        assert!(lines.iter().any(|l| l == "Login failed: Server error: status 500"));
        // A failed login never falls through to a session check
        assert_eq!(log.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_without_session_reports_fallback() {
        let (backend, _) = FakeBackend::new(vec![Reply::LoginThenCheck(false)], Reply::LoginError);
        let (mut monitor, mut rx) = monitor(backend);

        let pause = monitor.step().await;

        assert_eq!(pause, Duration::from_secs(10));
        assert_eq!(monitor.status(), Status::LoginFailed);
        let (_, lines) = drain(&mut rx);
        assert!(lines
            .iter()
            .any(|l| l == "Login failed: login succeeded but validation failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_error_is_logged_and_treated_as_invalid() {
        let (backend, _) = FakeBackend::new(
            vec![Reply::LoginThenCheck(true), Reply::CheckError],
            Reply::Check(true),
        );
        let (mut monitor, mut rx) = monitor(backend);
        monitor.step().await;
        drain(&mut rx);

        let pause = monitor.step().await;

        assert_eq!(pause, Duration::from_secs(10));
        assert_eq!(monitor.status(), Status::SessionInvalid);
        assert!(!monitor.backend().is_authenticated());
        let (statuses, lines) = drain(&mut rx);
        assert_eq!(statuses, vec![Status::SessionInvalid]);
        assert!(lines.iter().any(|l| l.starts_with("Session check error:")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_event_carries_authenticated_flag() {
        let (backend, _) = FakeBackend::new(vec![Reply::LoginThenCheck(true)], Reply::Check(true));
        let (mut monitor, mut rx) = monitor(backend);
        monitor.step().await;

        let flags: Vec<(Status, bool)> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                MonitorEvent::Status { status, authenticated, .. } => Some((status, authenticated)),
                _ => None,
            })
            .collect();
        assert_eq!(
            flags,
            vec![(Status::LoggingIn, false), (Status::LoginSucceeded, true)]
        );
    }

    // -------------------------------------------------------------------------
    // The loop
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_run_paces_cycles_sequentially() {
        let (backend, log) = FakeBackend::new(
            vec![
                Reply::LoginError,
                Reply::LoginThenCheck(true),
                Reply::Check(true),
                Reply::Check(false),
            ],
            Reply::LoginError,
        );
        let (monitor, _rx) = monitor(backend);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(stop_rx));

        // login error (retry 10s), login ok (steady 60s), check ok (steady 60s), check bad
        tokio::time::sleep(Duration::from_secs(135)).await;
        stop_tx.send(true).unwrap();
        tokio::time::timeout(SHUTDOWN_GRACE, handle).await.unwrap().unwrap();

        let log = log.lock().unwrap();
        assert!(!log.overlapped);
        let calls: Vec<Call> = log.calls.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            calls,
            vec![Call::Authenticate, Call::Authenticate, Call::Validate, Call::Validate]
        );

        let gaps: Vec<Duration> = log.calls.windows(2).map(|w| w[1].1 - w[0].1).collect();
        let call_time = Duration::from_millis(5);
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(10) + call_time,
                Duration::from_secs(60) + call_time,
                Duration::from_secs(60) + call_time,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_sleep_exits_without_further_calls() {
        let (backend, log) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, mut rx) = monitor(backend);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(stop_rx));

        // First login fails at t=0; the loop is now in its 10s retry sleep
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(log.lock().unwrap().calls.len(), 1);

        let stopped_at = Instant::now();
        stop_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(10) + SHUTDOWN_GRACE, handle)
            .await
            .unwrap()
            .unwrap();

        assert!(Instant::now() - stopped_at < SHUTDOWN_GRACE);
        assert_eq!(log.lock().unwrap().calls.len(), 1);
        let (_, lines) = drain(&mut rx);
        assert_eq!(lines.last().map(String::as_str), Some("Session monitor stopped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_makes_no_calls() {
        let (backend, log) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, _rx) = monitor(backend);
        let (_stop_tx, stop_rx) = watch::channel(true);

        monitor.run(stop_rx).await;

        assert!(log.lock().unwrap().calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_stops_loop() {
        let (backend, log) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, _rx) = monitor(backend);
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(monitor.run(stop_rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(stop_tx);
        tokio::time::timeout(SHUTDOWN_GRACE, handle).await.unwrap().unwrap();
        assert_eq!(log.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sender_dropped_before_run_makes_no_calls() {
        let (backend, log) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, _rx) = monitor(backend);
        let (stop_tx, stop_rx) = watch::channel(false);
        drop(stop_tx);

        tokio::time::timeout(SHUTDOWN_GRACE, monitor.run(stop_rx))
            .await
            .unwrap();
        assert!(log.lock().unwrap().calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_narrates_startup() {
        let (backend, _) = FakeBackend::new(vec![], Reply::LoginError);
        let (monitor, mut rx) = monitor(backend);
        let (_stop_tx, stop_rx) = watch::channel(true);

        monitor.run(stop_rx).await;

        let (statuses, lines) = drain(&mut rx);
        assert_eq!(statuses, vec![Status::Initializing]);
        assert_eq!(lines[0], "Session monitor started");
        assert_eq!(lines[1], "Username: alice");
        assert_eq!(lines[2], "Check interval: 60 seconds");
    }
}
