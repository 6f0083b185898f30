/// Externally visible state of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Unknown,
    Initializing,
    LoggingIn,
    LoginSucceeded,
    LoginFailed,
    SessionValid,
    SessionInvalid,
}

impl Status {
    /// Get the display label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Unknown => "Unknown",
            Status::Initializing => "Initializing...",
            Status::LoggingIn => "Logging in...",
            Status::LoginSucceeded => "Login succeeded",
            Status::LoginFailed => "Login failed",
            Status::SessionValid => "Session valid",
            Status::SessionInvalid => "Session invalid",
        }
    }

    /// True for the states that end a cycle with the retry interval.
    pub fn is_failure(&self) -> bool {
        matches!(self, Status::LoginFailed | Status::SessionInvalid)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
