//! Client configuration.
//!
//! Values come from the process environment (the host loads `.env` first).
//! Every field has a default so an empty environment still yields a usable
//! configuration.

use std::time::Duration;

use crate::errors::{ConfigError, Result};

pub const ENV_API_URL: &str = "LEDGERPULSE_API_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "LEDGERPULSE_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "LEDGERPULSE_REQUEST_TIMEOUT_MS";
pub const ENV_PAGE_SIZE: &str = "LEDGERPULSE_PAGE_SIZE";
pub const ENV_KEYRING_SERVICE: &str = "LEDGERPULSE_KEYRING_SERVICE";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_KEYRING_SERVICE: &str = "ledgerpulse";

/// Polling faster than this only hammers the remote service.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the remote data service, without trailing slash
    pub api_url: String,
    /// Period of the background refresh
    pub poll_interval: Duration,
    /// Period of the trial countdown refresh
    pub countdown_interval: Duration,
    pub request_timeout: Duration,
    /// Rows per page in the transaction list
    pub page_size: usize,
    /// Service name under which credentials are kept in the OS keyring
    pub keyring_service: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            countdown_interval: DEFAULT_COUNTDOWN_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup(ENV_API_URL)) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    key: ENV_API_URL.to_string(),
                    value: url,
                });
            }
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty(lookup(ENV_POLL_INTERVAL_MS)) {
            let millis = parse_positive(ENV_POLL_INTERVAL_MS, &raw)?;
            config.poll_interval = Duration::from_millis(millis).max(MIN_POLL_INTERVAL);
        }

        if let Some(raw) = non_empty(lookup(ENV_REQUEST_TIMEOUT_MS)) {
            config.request_timeout =
                Duration::from_millis(parse_positive(ENV_REQUEST_TIMEOUT_MS, &raw)?);
        }

        if let Some(raw) = non_empty(lookup(ENV_PAGE_SIZE)) {
            config.page_size = parse_positive(ENV_PAGE_SIZE, &raw)? as usize;
        }

        if let Some(service) = non_empty(lookup(ENV_KEYRING_SERVICE)) {
            config.keyring_service = service;
        }

        Ok(config)
    }

    /// Builder-style override of the polling period, clamped to the minimum.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_positive(key: &str, raw: &str) -> std::result::Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
