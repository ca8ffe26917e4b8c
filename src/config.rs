use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Default configuration values
const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
const DEFAULT_LOGIN_PATH: &str = "/auth/login";
const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_REFRESH_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the TaskHub client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the TaskHub backend, without a trailing slash
    pub base_url: String,
    /// Path of the token refresh endpoint, relative to the base URL
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Path of the login endpoint, relative to the base URL
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path of the logout endpoint, relative to the base URL
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Timeout for ordinary requests, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Timeout for the token refresh exchange, in seconds.
    ///
    /// Every request queued behind an in-flight refresh waits for this
    /// exchange, so a hung refresh would stall all of them. The timeout
    /// bounds that wait.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_seconds: u64,
    /// Programmatic refresh timeout, taking precedence over the seconds
    /// field. Not read from the environment; keeps sub-second precision.
    #[serde(skip)]
    refresh_timeout_override: Option<Duration>,
}

// Default functions
fn default_refresh_path() -> String {
    std::env::var("TASKHUB_REFRESH_PATH").unwrap_or_else(|_| DEFAULT_REFRESH_PATH.to_string())
}

fn default_login_path() -> String {
    std::env::var("TASKHUB_LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string())
}

fn default_logout_path() -> String {
    std::env::var("TASKHUB_LOGOUT_PATH").unwrap_or_else(|_| DEFAULT_LOGOUT_PATH.to_string())
}

fn default_request_timeout() -> u64 {
    std::env::var("TASKHUB_REQUEST_TIMEOUT")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS)
}

fn default_refresh_timeout() -> u64 {
    std::env::var("TASKHUB_REFRESH_TIMEOUT")
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(DEFAULT_REFRESH_TIMEOUT_SECONDS)
}

impl ClientConfig {
    /// Create a configuration for the given backend base URL with defaults
    /// for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            refresh_path: default_refresh_path(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            request_timeout_seconds: default_request_timeout(),
            refresh_timeout_seconds: default_refresh_timeout(),
            refresh_timeout_override: None,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// `TASKHUB_BASE_URL` is required; the remaining variables fall back to
    /// their defaults when unset.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TASKHUB_BASE_URL")
            .map_err(|_| anyhow!("TASKHUB_BASE_URL environment variable not set"))?;

        if base_url.is_empty() {
            return Err(anyhow!("TASKHUB_BASE_URL is empty"));
        }

        Ok(Self::new(base_url))
    }

    /// Override the refresh exchange timeout. The duration is kept as given,
    /// sub-second values included.
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout_override = Some(timeout);
        self
    }

    /// Full URL of the refresh endpoint
    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url, self.refresh_path)
    }

    /// Full URL of the login endpoint
    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    /// Full URL of the logout endpoint
    pub fn logout_url(&self) -> String {
        format!("{}{}", self.base_url, self.logout_path)
    }

    /// Timeout for ordinary requests
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Timeout for the refresh exchange
    pub fn refresh_timeout(&self) -> Duration {
        self.refresh_timeout_override
            .unwrap_or_else(|| Duration::from_secs(self.refresh_timeout_seconds))
    }
}
