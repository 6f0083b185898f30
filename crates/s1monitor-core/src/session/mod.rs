//! Forum session management.
//!
//! This module provides:
//! - `SessionClient`: cookie-backed HTTP client that logs in and checks the session
//! - `Credentials`: validated username/password pair
//! - `SessionBackend`: the seam the polling loop drives
//!
//! The forum exposes no login-success marker, so a session counts as valid
//! when the account name is rendered somewhere on the check page.

pub mod client;
pub mod credentials;
pub mod error;

use async_trait::async_trait;

pub use client::{Endpoints, SessionClient};
pub use credentials::{Credentials, CredentialsError};
pub use error::SessionError;

/// Operations the polling loop needs from a session.
///
/// Implementations own their authentication state; callers only read it
/// through `is_authenticated`.
#[async_trait]
pub trait SessionBackend: Send {
    /// Submit credentials, then validate. `Ok(())` does not imply the
    /// session is live; check `is_authenticated` afterwards.
    async fn authenticate(&mut self) -> Result<(), SessionError>;

    /// Fetch the check page and report whether the account name is on it.
    async fn validate(&mut self) -> Result<bool, SessionError>;

    /// Last known authentication state. No network call.
    fn is_authenticated(&self) -> bool;
}
