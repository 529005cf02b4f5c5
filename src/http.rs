//! Shared HTTP client construction and response handling

use std::time::Duration;

use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::weather::ApiError;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("WildWeather/", env!("CARGO_PKG_VERSION"));

/// Build a client with a request timeout and transient-failure retries.
///
/// `max_retries == 0` sends every request exactly once.
pub fn build_client(
    timeout: Duration,
    user_agent: &str,
    max_retries: u32,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?;

    let builder = ClientBuilder::new(client);
    let builder = if max_retries > 0 {
        let policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder.with(RetryTransientMiddleware::new_with_policy(policy))
    } else {
        builder
    };
    Ok(builder.build())
}

/// Send a GET request and decode the JSON body, mapping failures onto [`ApiError`]
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    url: &str,
) -> Result<T, ApiError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::Network(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

/// Map a non-success status onto the error surfaced to callers
#[must_use]
pub fn classify_status(status: StatusCode, body: &str) -> ApiError {
    match status.as_u16() {
        401 => ApiError::InvalidKey,
        429 => ApiError::RateLimited,
        _ => ApiError::Network(format!("HTTP {status}: {body}")),
    }
}
