use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER, USER_AGENT,
};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::cancel::CancelToken;
use crate::errors::{classify, ApiError, ErrorBody, ProofError, Result};
use crate::models::{object_from_bytes, ApiObject, Query};

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_MAX_MS: u64 = 10_000;

pub(crate) const USER_AGENT_VALUE: &str = concat!("proof-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Delay before retry number `attempt + 1`: 1s, 2s, 4s, 8s, then 10s flat.
pub fn backoff(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_MAX_MS))
}

/// Authenticated JSON transport shared by every resource.
///
/// Each call retries `429`, `5xx`, and connection failures up to
/// `max_retries` times, then either returns the response object or a
/// classified [`ApiError`]. Other `4xx` responses are never retried.
///
/// The transport holds no mutable state; it is cheap to share behind an `Arc`
/// and safe to use from concurrent tasks.
#[derive(Debug, Clone)]
pub struct Transport {
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    http: reqwest::Client,
}

impl Transport {
    pub(crate) fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| ProofError::Config(format!("API key is not a valid header value: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProofError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout applied to every attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn get(&self, cancel: &CancelToken, path: &str, query: &Query<'_>) -> Result<ApiObject> {
        self.request(cancel, Method::GET, path, query, None).await
    }

    /// POST `body` as JSON. A body that serializes to `null` sends no body.
    pub async fn post<B>(&self, cancel: &CancelToken, path: &str, body: &B) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(cancel, Method::POST, path, &[], body).await
    }

    pub async fn put<B>(&self, cancel: &CancelToken, path: &str, body: &B) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(cancel, Method::PUT, path, &[], body).await
    }

    pub async fn patch<B>(&self, cancel: &CancelToken, path: &str, body: &B) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(cancel, Method::PATCH, path, &[], body).await
    }

    pub async fn delete(&self, cancel: &CancelToken, path: &str) -> Result<ApiObject> {
        self.request(cancel, Method::DELETE, path, &[], None).await
    }

    pub async fn delete_with_body<B>(
        &self,
        cancel: &CancelToken,
        path: &str,
        body: &B,
    ) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(cancel, Method::DELETE, path, &[], body).await
    }

    /// Run one logical request through the retry loop.
    #[tracing::instrument(level = "debug", skip_all, fields(method = %method, path = %path))]
    async fn request(
        &self,
        cancel: &CancelToken,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<ApiObject> {
        let url = self.url(path, query)?;
        let mut last_failure: Option<reqwest::Error> = None;

        for attempt in 0..=self.max_retries {
            let retries_left = attempt < self.max_retries;

            let mut req = self.http.request(method.clone(), url.clone());
            if let Some(ref bytes) = body {
                req = req.body(bytes.clone());
            }

            debug!(attempt, "sending request");
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(timed_out(&method, path).into()),
                sent = req.send() => sent,
            };

            let response = match sent {
                Ok(r) => r,
                Err(e) if retries_left => {
                    let delay = backoff(attempt);
                    warn!(attempt, error = %e, ?delay, "request failed, retrying");
                    last_failure = Some(e);
                    self.pause(cancel, delay, &method, path).await?;
                    continue;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "request failed, no retries left");
                    last_failure = Some(e);
                    break;
                }
            };

            let status = response.status();
            let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                retry_after_header(&response)
            } else {
                None
            };

            if status == StatusCode::TOO_MANY_REQUESTS && retries_left {
                let delay = retry_after.unwrap_or_else(|| backoff(attempt));
                warn!(attempt, ?delay, "rate limited, retrying");
                self.pause(cancel, delay, &method, path).await?;
                continue;
            }

            if status.as_u16() >= 500 && retries_left {
                let delay = backoff(attempt);
                warn!(attempt, status = status.as_u16(), ?delay, "server error, retrying");
                self.pause(cancel, delay, &method, path).await?;
                continue;
            }

            let bytes = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(timed_out(&method, path).into()),
                bytes = response.bytes() => bytes.map_err(unreadable_body)?,
            };

            debug!(attempt, status = status.as_u16(), "response received");
            return finish(status.as_u16(), &bytes, retry_after);
        }

        let err = match last_failure {
            Some(e) => ApiError::network(e.to_string()),
            None => ApiError::network("Network request failed"),
        };
        Err(err.into())
    }

    fn url(&self, path: &str, query: &Query<'_>) -> std::result::Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::network(format!("invalid request URL: {e}")))?;

        let pairs: Vec<_> = query.iter().filter(|(_, v)| !v.is_empty()).collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Sleep between attempts unless the caller gives up first.
    async fn pause(
        &self,
        cancel: &CancelToken,
        delay: Duration,
        method: &Method,
        path: &str,
    ) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(timed_out(method, path).into()),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn timed_out(method: &Method, path: &str) -> ApiError {
    ApiError::timeout(format!("Request to {method} {path} timed out"))
}

fn unreadable_body(e: reqwest::Error) -> ApiError {
    ApiError::network(format!("failed to read response body: {e}"))
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Option<Vec<u8>>> {
    let bytes = serde_json::to_vec(body)?;
    Ok((bytes != b"null").then_some(bytes))
}

fn retry_after_header(response: &Response) -> Option<Duration> {
    parse_retry_after(response.headers().get(RETRY_AFTER)?.to_str().ok()?)
}

/// `Retry-After` as fractional seconds. HTTP-date values and anything a
/// `Duration` cannot hold are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    if secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Turn the final response into a result object or a classified error.
fn finish(status: u16, bytes: &[u8], retry_after: Option<Duration>) -> Result<ApiObject> {
    let obj = object_from_bytes(bytes);
    if status < 400 {
        return Ok(obj);
    }

    let mut body = ErrorBody::from_value(&Value::Object(obj));
    if status == 429 {
        // Surface the header to the caller when the body has no hint of its own.
        if let Some(hint) = retry_after {
            let b = body.get_or_insert_with(ErrorBody::default);
            if b.retry_after.is_none() {
                b.retry_after = Some(hint.as_secs_f64().ceil() as u64);
            }
        }
    }

    Err(classify(status, body.as_ref()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn transport() -> Transport {
        Transport::new("pk_test", "http://localhost/", Duration::from_secs(5), 0).unwrap()
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let cases = [(0, 1000), (1, 2000), (2, 4000), (3, 8000), (4, 10000), (10, 10000)];
        for (attempt, want_ms) in cases {
            assert_eq!(backoff(attempt), Duration::from_millis(want_ms), "attempt {attempt}");
        }
        assert_eq!(backoff(u32::MAX), Duration::from_millis(10000));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let t = transport();
        assert_eq!(t.base_url(), "http://localhost");
        let url = t.url("/api/v1/things", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/v1/things");
    }

    #[test]
    fn empty_query_values_are_dropped() {
        let url = transport()
            .url("/api/v1/things", &[("status", "verified"), ("cursor", ""), ("limit", "10")])
            .unwrap();
        assert_eq!(url.query(), Some("status=verified&limit=10"));

        let url = transport().url("/api/v1/things", &[("cursor", "")]).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn malformed_url_is_a_network_error() {
        let t = Transport::new("pk_test", "not a url", Duration::from_secs(5), 0).unwrap();
        let err = t.url("/x", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.code(), "network_error");
    }

    #[test]
    fn null_bodies_are_not_sent() {
        assert_eq!(encode(&()).unwrap(), None);
        assert_eq!(encode(&None::<String>).unwrap(), None);
        assert_eq!(
            encode(&serde_json::json!({ "code": "A1" })).unwrap(),
            Some(br#"{"code":"A1"}"#.to_vec())
        );
    }

    #[test]
    fn unserializable_body_is_a_serialization_error() {
        let mut bad = std::collections::HashMap::new();
        bad.insert(vec![1u8], "value");
        assert!(matches!(encode(&bad), Err(ProofError::Serialization(_))));
    }

    #[test]
    fn finish_classifies_error_bodies() {
        let body = br#"{"error":{"code":"invalid","message":"Bad","request_id":"req_1"}}"#;
        let err = finish(400, body, None).unwrap_err();
        let api = err.as_api_error().unwrap();
        assert_eq!(api.kind(), ErrorKind::Validation);
        assert_eq!(api.code(), "invalid");
        assert_eq!(api.request_id(), Some("req_1"));
    }

    #[test]
    fn finish_uses_retry_after_header_as_hint() {
        let err = finish(429, b"", Some(Duration::from_millis(1500))).unwrap_err();
        assert_eq!(err.as_api_error().unwrap().retry_after(), Some(2));

        let body = br#"{"error":{"retryAfter":60}}"#;
        let err = finish(429, body, Some(Duration::from_secs(5))).unwrap_err();
        assert_eq!(err.as_api_error().unwrap().retry_after(), Some(60));
    }

    #[test]
    fn finish_returns_empty_object_for_unparsable_success() {
        assert!(finish(200, b"not json", None).unwrap().is_empty());
        assert!(finish(204, b"", None).unwrap().is_empty());
    }

    #[test]
    fn retry_after_parsing_ignores_values_a_duration_cannot_hold() {
        assert_eq!(parse_retry_after(" 2.5 "), Some(Duration::from_millis(2500)));
        assert_eq!(parse_retry_after("0"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("1e30"), None);
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("inf"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn unreadable_body_is_a_network_error() {
        let e = reqwest::get("http://127.0.0.1:1/").await.unwrap_err();
        let err = unreadable_body(e);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.message().starts_with("failed to read response body"), "{}", err.message());
    }
}
