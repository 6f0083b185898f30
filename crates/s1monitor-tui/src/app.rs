//! Application state for the console view.
//!
//! `App` mirrors what the session monitor reports: a bounded buffer of log
//! lines and the latest status. The monitor runs in a background task and
//! sends `MonitorEvent`s over a channel that the UI loop drains each frame.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use s1monitor_core::{MonitorEvent, Status};
use tokio::sync::mpsc;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the monitor event channel.
/// The monitor emits a handful of events per cycle, so this absorbs long UI stalls.
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Number of log lines kept for display.
pub const LOG_BUFFER_SIZE: usize = 1000;

/// Number of lines to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Timestamp format for log lines and the status bar clock
const TIME_FORMAT: &str = "%H:%M:%S";

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Login summary shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginIndicator {
    LoggedIn,
    LoggingIn,
    Failed,
    LoggedOut,
}

impl LoginIndicator {
    pub fn from_status(status: Status, authenticated: bool) -> Self {
        if authenticated {
            LoginIndicator::LoggedIn
        } else if status == Status::LoggingIn {
            LoginIndicator::LoggingIn
        } else if status.is_failure() {
            LoginIndicator::Failed
        } else {
            LoginIndicator::LoggedOut
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoginIndicator::LoggedIn => "Logged in",
            LoginIndicator::LoggingIn => "Logging in",
            LoginIndicator::Failed => "Login failed",
            LoginIndicator::LoggedOut => "Not logged in",
        }
    }
}

pub struct App {
    pub state: AppState,
    pub username: String,

    // Latest report from the monitor
    pub status: Status,
    pub authenticated: bool,
    pub status_at: DateTime<Local>,

    pub logs: VecDeque<String>,
    /// Lines scrolled up from the bottom; 0 follows new output
    pub scroll: usize,

    events_rx: mpsc::Receiver<MonitorEvent>,
}

impl App {
    pub fn new(username: impl Into<String>, events_rx: mpsc::Receiver<MonitorEvent>) -> Self {
        Self {
            state: AppState::Running,
            username: username.into(),
            status: Status::Initializing,
            authenticated: false,
            status_at: Local::now(),
            logs: VecDeque::with_capacity(LOG_BUFFER_SIZE),
            scroll: 0,
            events_rx,
        }
    }

    pub fn login_indicator(&self) -> LoginIndicator {
        LoginIndicator::from_status(self.status, self.authenticated)
    }

    pub fn status_time(&self) -> String {
        self.status_at.format(TIME_FORMAT).to_string()
    }

    /// Drain everything the monitor has sent since the last frame.
    pub fn check_monitor_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.process_event(event);
        }
    }

    fn process_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Log { at, message } => {
                self.push_log(format!("[{}] {}", at.format(TIME_FORMAT), message));
            }
            MonitorEvent::Status {
                at,
                status,
                authenticated,
            } => {
                self.status = status;
                self.authenticated = authenticated;
                self.status_at = at;
            }
        }
    }

    pub fn push_log(&mut self, line: String) {
        self.logs.push_back(line);
        if self.logs.len() > LOG_BUFFER_SIZE {
            self.logs.pop_front();
        }
        if self.scroll > 0 {
            // Keep a scrolled-back view anchored on the same lines
            self.scroll = (self.scroll + 1).min(self.logs.len().saturating_sub(1));
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = self.logs.len().saturating_sub(1);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    /// Lines that fit in a pane `height` rows tall, honoring the scroll offset.
    pub fn visible_logs(&self, height: usize) -> Vec<&str> {
        let end = self.logs.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.logs
            .range(start..end)
            .map(String::as_str)
            .collect()
    }

    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }
}
