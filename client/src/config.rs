//! Configuration for the wheelspin client.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

/// Base URL used when `WHEELSPIN_BASE_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Where the players, tickets and spin services are served
    pub base_url: String,
    /// Per-request HTTP timeout; expiry surfaces as a failure action
    pub request_timeout: Duration,
    /// How long the binary waits for an intent and its follow-ups to settle
    pub action_timeout: Duration,
    /// Log level for the wheelspin targets when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            action_timeout: Duration::from_secs(DEFAULT_ACTION_TIMEOUT_SECS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment
    ///
    /// - `WHEELSPIN_BASE_URL` (default `http://localhost:8080`)
    /// - `WHEELSPIN_REQUEST_TIMEOUT_SECS` (default 10)
    /// - `WHEELSPIN_ACTION_TIMEOUT_SECS` (default 15)
    /// - `WHEELSPIN_LOG_LEVEL` (default `info`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a non-numeric or zero timeout, or a base URL
    /// without an http(s) scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            base_url: lookup("WHEELSPIN_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: seconds(&lookup, "WHEELSPIN_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout),
            action_timeout: seconds(&lookup, "WHEELSPIN_ACTION_TIMEOUT_SECS")?
                .unwrap_or(defaults.action_timeout),
            log_level: lookup("WHEELSPIN_LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check invariants not enforced by the types
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` when the URL is not http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
        }
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the per-request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the intent settle timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Replace the log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn seconds<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ConfigError::InvalidDuration { var, value }),
    }
}
