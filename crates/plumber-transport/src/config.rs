//! Transport configuration.

use std::time::Duration;

/// Environment variable holding the server base URL.
pub const BASE_URL_ENV: &str = "PLUMBER_API_URL";
/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:52281";
/// Upper bound on a single call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
/// Path of the RPC endpoint below the base URL.
pub const RPC_PATH: &str = "/api/rpc";

/// Where and how long to talk to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TransportConfig {
    /// Config for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the base URL from [`BASE_URL_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the base URL through an arbitrary variable lookup.
    ///
    /// Unset and empty values fall back to [`DEFAULT_BASE_URL`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        lookup(BASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .map_or_else(Self::default, Self::new)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the RPC endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{RPC_PATH}", self.base_url.trim().trim_end_matches('/'))
    }
}
