//! Shared request plumbing for the algod, indexer, and KMD clients.
//!
//! Reads ([`read_json`]) retry transient transport failures with exponential
//! backoff: 200ms, 400ms, 800ms, then one final attempt. 4xx/5xx responses
//! and deserialization failures are returned immediately.
//!
//! Writes ([`write_json`]) are sent exactly once.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::config::ConfigError;
use crate::error::AlgoApiError;

/// Maximum number of retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries.
const BASE_DELAY_MS: u64 = 200;

/// Build a `reqwest::Client` that sends `token` under `header` on every call.
///
/// An empty token sends no header.
pub(crate) fn build_http(
    header: &'static str,
    token: &str,
    timeout_secs: u64,
) -> Result<reqwest::Client, AlgoApiError> {
    let mut headers = HeaderMap::new();
    if !token.is_empty() {
        headers.insert(
            HeaderName::from_static(header),
            HeaderValue::from_str(token).map_err(|_| ConfigError::InvalidToken(header))?,
        );
    }
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| AlgoApiError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
}

/// Send an idempotent request, retrying transport errors, and decode JSON.
pub(crate) async fn read_json<T, F>(endpoint: &str, build: F) -> Result<T, AlgoApiError>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    let resp = send_with_retry(endpoint, &build).await?;
    decode(endpoint, resp).await
}

/// Send a non-idempotent request exactly once and decode JSON.
pub(crate) async fn write_json<T: DeserializeOwned>(
    endpoint: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, AlgoApiError> {
    let resp = request.send().await.map_err(|e| AlgoApiError::Http {
        endpoint: endpoint.to_string(),
        source: e,
    })?;
    decode(endpoint, resp).await
}

async fn send_with_retry<F>(endpoint: &str, build: &F) -> Result<reqwest::Response, AlgoApiError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        match build().send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < MAX_RETRIES => {
                let delay = Duration::from_millis(BASE_DELAY_MS << attempt);
                tracing::warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(AlgoApiError::Http {
                    endpoint: endpoint.to_string(),
                    source: e,
                })
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<T, AlgoApiError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(AlgoApiError::ApiError {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }
    resp.json().await.map_err(|e| AlgoApiError::Deserialization {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn read_retries_until_attempts_are_exhausted() {
        let calls = AtomicU32::new(0);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        // Guaranteed-closed port → connection refused on every attempt.
        let result: Result<serde_json::Value, _> = read_json("GET /closed", || {
            calls.fetch_add(1, Ordering::SeqCst);
            http.get("http://127.0.0.1:1/")
        })
        .await;

        assert!(matches!(result, Err(AlgoApiError::Http { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[test]
    fn empty_token_sends_no_header() {
        assert!(build_http("x-algo-api-token", "", 5).is_ok());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let err = build_http("x-algo-api-token", "bad\ntoken", 5).unwrap_err();
        assert!(matches!(
            err,
            AlgoApiError::Config(ConfigError::InvalidToken("x-algo-api-token"))
        ));
    }
}
