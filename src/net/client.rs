//! HTTP client shared by the token exchange and the Platform API calls.

use reqwest::Client;
use std::time::Duration;

/// Default user agent for the application.
pub const USER_AGENT: &str = concat!("bungie-link/", env!("CARGO_PKG_VERSION"));

/// Default connection timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper over a configured [`reqwest::Client`].
///
/// Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent and timeouts,
    /// falling back to reqwest defaults if that configuration is rejected.
    pub fn new() -> Self {
        let inner = match Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build HTTP client with custom config, using defaults");
                Client::default()
            }
        };
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
