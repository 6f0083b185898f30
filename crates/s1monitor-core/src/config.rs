//! Application configuration management.
//!
//! Configuration is a small YAML file holding the forum credentials and,
//! optionally, the two polling intervals:
//!
//! ```yaml
//! username: alice
//! password: hunter2
//! check_interval_secs: 60
//! retry_delay_secs: 10
//! ```
//!
//! `S1MONITOR_USERNAME` / `S1MONITOR_PASSWORD` override the file values.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitor::controller::{DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_RETRY_DELAY_SECS};
use crate::monitor::Intervals;
use crate::session::{Credentials, CredentialsError};

/// Config file name used when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

pub const USERNAME_ENV: &str = "S1MONITOR_USERNAME";
pub const PASSWORD_ENV: &str = "S1MONITOR_PASSWORD";

/// Placeholder values written into a fresh config file
const PLACEHOLDER_USERNAME: &str = "your_username";
const PLACEHOLDER_PASSWORD: &str = "your_password";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Config is missing username/password: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_retry_delay() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: PLACEHOLDER_USERNAME.to_string(),
            password: PLACEHOLDER_PASSWORD.to_string(),
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.check_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("check_interval_secs"));
        }
        if config.retry_delay_secs == 0 {
            return Err(ConfigError::ZeroInterval("retry_delay_secs"));
        }
        Ok(config)
    }

    /// Write a placeholder config for the user to fill in.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_yaml::to_string(&Self::default())?;
        std::fs::write(path, contents).map_err(io_err)?;
        Ok(())
    }

    /// Replace credentials with any non-empty override.
    pub fn apply_overrides(&mut self, username: Option<String>, password: Option<String>) {
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            self.username = username;
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.password = password;
        }
    }

    /// Apply `S1MONITOR_USERNAME` / `S1MONITOR_PASSWORD` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::var(USERNAME_ENV).ok(), std::env::var(PASSWORD_ENV).ok());
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials::new(self.username.clone(), self.password.clone())?)
    }

    pub fn intervals(&self) -> Intervals {
        Intervals {
            steady: Duration::from_secs(self.check_interval_secs),
            retry: Duration::from_secs(self.retry_delay_secs),
        }
    }
}
