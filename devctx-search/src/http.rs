//! Shared HTTP client and response helpers for source API requests.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::GatherConfig;
use crate::error::SearchError;
use crate::types::Source;

/// Build a [`reqwest::Client`] for the source APIs.
///
/// The client has the configured timeout and User-Agent, asks for JSON,
/// and transparently decompresses brotli and gzip bodies.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &GatherConfig) -> Result<reqwest::Client, SearchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode the JSON body.
///
/// 429 and 403 map to [`SearchError::RateLimited`] so the limiter retries
/// them. Other non-success statuses map to [`SearchError::Http`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    source: Source,
    request: reqwest::RequestBuilder,
) -> Result<T, SearchError> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("{source} request failed: {e}")))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
        return Err(SearchError::RateLimited(format!("{source} returned {status}")));
    }
    if !status.is_success() {
        return Err(SearchError::Http(format!("{source} returned {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SearchError::Http(format!("{source} response read failed: {e}")))?;
    tracing::trace!(%source, bytes = body.len(), "source response received");

    serde_json::from_str(&body)
        .map_err(|e| SearchError::Parse(format!("{source} response is not valid JSON: {e}")))
}
