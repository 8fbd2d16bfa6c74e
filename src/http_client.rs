//! Shared HTTP client construction policy.
//!
//! Index and content clients share connect timeout, compression and
//! User-Agent defaults. Total request timeouts are applied per request by
//! callers, and only when configured.

use std::time::Duration;

use reqwest::Client;

/// Connect timeout applied to every archive connection.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds an HTTP client with the project's shared defaults.
pub(crate) fn build_http_client(user_agent: String) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(user_agent)
        .gzip(true)
        .build()
}

/// Applies an optional total timeout to a request.
pub(crate) fn with_timeout(
    request: reqwest::RequestBuilder,
    timeout: Option<Duration>,
) -> reqwest::RequestBuilder {
    match timeout {
        Some(timeout) => request.timeout(timeout),
        None => request,
    }
}
