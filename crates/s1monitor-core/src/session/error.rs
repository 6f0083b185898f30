use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Rate limited - server returned 429")]
    RateLimited,

    #[error("Server error: status {0}")]
    ServerError(u16),

    #[error("Unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("Session validation failed: {0}")]
    Validation(#[source] Box<SessionError>),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SessionError::Timeout(err)
        } else {
            SessionError::Network(err)
        }
    }
}

impl SessionError {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            429 => SessionError::RateLimited,
            code @ 500..=599 => SessionError::ServerError(code),
            code => SessionError::UnexpectedStatus(code),
        }
    }
}
