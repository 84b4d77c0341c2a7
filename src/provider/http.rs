//! Shared HTTP client construction policy for token-protocol adapters.
//!
//! Centralizes timeouts and the fixed browser-identifying header set so
//! every provider call presents the same traffic shape the providers'
//! private APIs expect.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::user_agent;

use super::ProviderError;

/// Connect timeout for provider calls.
pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Read timeout for provider calls; the copy call overrides this per-request.
pub(crate) const READ_TIMEOUT_SECS: u64 = 30;

/// Accept-Language presented on every provider call.
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";

/// Builds a provider HTTP client carrying the fixed header set
/// (user-agent, origin, referer, accept-language, optional account cookie).
///
/// # Errors
///
/// Returns [`ProviderError::ClientBuild`] when a header value is malformed
/// or client construction fails.
pub(crate) fn build_provider_http_client(
    origin: &str,
    referer: &str,
    cookie_header: Option<&str>,
) -> Result<Client, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ORIGIN, header_value(origin)?);
    headers.insert(header::REFERER, header_value(referer)?);
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    if let Some(cookie) = cookie_header {
        headers.insert(header::COOKIE, header_value(cookie)?);
    }

    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(user_agent::provider_user_agent())
        .gzip(true)
        .default_headers(headers)
        .build()
        .map_err(|e| ProviderError::ClientBuild(e.to_string()))
}

fn header_value(value: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(value)
        .map_err(|e| ProviderError::ClientBuild(format!("invalid header value: {e}")))
}
