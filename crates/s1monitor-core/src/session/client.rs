//! HTTP session client for the Stage1st forum.
//!
//! `SessionClient` holds a cookie jar for the lifetime of the process. Login
//! posts the credential form and then asks the check page whether the account
//! name shows up; that answer is the only source of truth for "logged in".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, info, warn};

use super::{Credentials, SessionBackend, SessionError};

// ============================================================================
// Constants
// ============================================================================

/// Forum root. Both endpoints hang off it.
pub const BASE_URL: &str = "https://stage1st.com/2b/";

/// Login submission endpoint, relative to the base URL.
const LOGIN_PATH: &str =
    "member.php?mod=logging&action=login&loginsubmit=yes&infloat=yes&lssubmit=yes&inajax=1";

/// A page that renders the account name when logged in.
const CHECK_PATH: &str = "forum.php";

/// Desktop browser identity; the forum serves different markup to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

/// The two URLs the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub check: String,
}

impl Endpoints {
    /// Build endpoints under `base`, which should end with a slash.
    pub fn from_base(base: &str) -> Self {
        Self {
            login: format!("{}{}", base, LOGIN_PATH),
            check: format!("{}{}", base, CHECK_PATH),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_base(BASE_URL)
    }
}

pub struct SessionClient {
    client: Client,
    credentials: Credentials,
    endpoints: Endpoints,
    authenticated: bool,
}

impl SessionClient {
    /// Create a client for the live forum with the default timeout.
    pub fn new(credentials: Credentials) -> Result<Self, SessionError> {
        Self::with_options(
            credentials,
            Endpoints::default(),
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        credentials: Credentials,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(SessionError::ClientBuild)?;

        Ok(Self {
            client,
            credentials,
            endpoints,
            authenticated: false,
        })
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Post the login form, then validate.
    ///
    /// Returns `Ok(())` whenever the login request went through and the
    /// follow-up check completed, even if the check found no session.
    pub async fn authenticate(&mut self) -> Result<(), SessionError> {
        info!(user = %self.username(), "Submitting login form");

        let form = [
            ("fastloginfield", "username"),
            ("username", self.credentials.username()),
            ("password", self.credentials.password()),
            ("quickforward", "yes"),
            ("handlekey", "ls"),
        ];

        let response = match self.client.post(&self.endpoints.login).form(&form).send().await {
            Ok(response) => response,
            Err(e) => {
                self.authenticated = false;
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            self.authenticated = false;
            return Err(SessionError::from_status(response.status()));
        }

        debug!("Login request accepted, validating session");
        let valid = self
            .validate()
            .await
            .map_err(|e| SessionError::Validation(Box::new(e)))?;

        if valid {
            info!(user = %self.username(), "Login succeeded");
        } else {
            warn!(
                "Login request succeeded but the session check failed; \
                 credentials may be wrong or the page layout changed"
            );
        }
        Ok(())
    }

    /// Fetch the check page and look for the account name.
    ///
    /// A page without the name is a normal `Ok(false)`, not an error.
    pub async fn validate(&mut self) -> Result<bool, SessionError> {
        debug!(user = %self.username(), "Checking session");

        match self.fetch_check_page().await {
            Ok(body) => {
                let valid = body.contains(self.credentials.username());
                if valid {
                    debug!("Account name found on page, session valid");
                } else {
                    debug!("Account name not found on page, session invalid");
                }
                self.authenticated = valid;
                Ok(valid)
            }
            Err(e) => {
                self.authenticated = false;
                Err(e)
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn fetch_check_page(&self) -> Result<String, SessionError> {
        let response = self
            .client
            .get(&self.endpoints.check)
            .header(header::ACCEPT, "text/html")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::from_status(response.status()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SessionBackend for SessionClient {
    async fn authenticate(&mut self) -> Result<(), SessionError> {
        SessionClient::authenticate(self).await
    }

    async fn validate(&mut self) -> Result<bool, SessionError> {
        SessionClient::validate(self).await
    }

    fn is_authenticated(&self) -> bool {
        SessionClient::is_authenticated(self)
    }
}
