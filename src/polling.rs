use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::errors::{ApiError, ProofError, Result};
use crate::models::{status_of, ApiObject};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Polling config for `wait_for_completion`.
///
/// Zero fields fall back to the defaults (3s interval, 10min timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between retrievals. Default: 3s.
    pub interval: Duration,
    /// Overall budget. Default: 10min.
    pub timeout: Duration,
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Effective `(interval, timeout)`.
    pub fn resolve(opts: Option<&WaitOptions>) -> (Duration, Duration) {
        let pick = |value: Option<Duration>, default: Duration| {
            value.filter(|d| !d.is_zero()).unwrap_or(default)
        };
        (
            pick(opts.map(|o| o.interval), DEFAULT_INTERVAL),
            pick(opts.map(|o| o.timeout), DEFAULT_TIMEOUT),
        )
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Call `retrieve` until the result's `status` satisfies `is_terminal`.
///
/// Errors from `retrieve` end the poll immediately. Once `timeout` has
/// elapsed without a terminal status the poll fails with a
/// [`PollingTimeout`](crate::ErrorKind::PollingTimeout) error naming `label`
/// and the last status seen. Firing `cancel` during the wait between
/// retrievals returns [`ProofError::Cancelled`] (or
/// [`ProofError::DeadlineExceeded`] for a token deadline).
#[tracing::instrument(level = "debug", skip(cancel, retrieve, is_terminal, opts))]
pub async fn poll_until_complete<F, Fut, P>(
    cancel: &CancelToken,
    mut retrieve: F,
    is_terminal: P,
    label: &str,
    opts: Option<&WaitOptions>,
) -> Result<ApiObject>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ApiObject>>,
    P: Fn(&str) -> bool,
{
    let (interval, timeout) = WaitOptions::resolve(opts);
    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        let resource = retrieve().await?;
        polls += 1;

        let status = status_of(&resource);
        if is_terminal(status) {
            debug!(polls, status, "reached terminal status");
            return Ok(resource);
        }

        if start.elapsed() >= timeout {
            return Err(ApiError::polling_timeout(format!(
                "{label} did not complete within {timeout:?} (last status: {status})"
            ))
            .into());
        }

        debug!(polls, status, ?interval, "not terminal yet, waiting");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(if cancel.deadline_exceeded() {
                    ProofError::DeadlineExceeded
                } else {
                    ProofError::Cancelled
                });
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn resource(status: &str) -> Result<ApiObject> {
        Ok(json!({ "id": "ver_1", "status": status })
            .as_object()
            .cloned()
            .unwrap())
    }

    fn fast() -> WaitOptions {
        WaitOptions::new(Duration::from_millis(10), Duration::from_secs(5))
    }

    #[test]
    fn resolve_defaults() {
        assert_eq!(
            WaitOptions::resolve(None),
            (Duration::from_secs(3), Duration::from_secs(600))
        );
        assert_eq!(
            WaitOptions::resolve(Some(&WaitOptions::default())),
            (Duration::from_secs(3), Duration::from_secs(600))
        );
    }

    #[test]
    fn resolve_overrides() {
        let opts = WaitOptions::new(Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(
            WaitOptions::resolve(Some(&opts)),
            (Duration::from_secs(1), Duration::from_secs(30))
        );
    }

    #[test]
    fn resolve_ignores_zero_fields() {
        let opts = WaitOptions::new(Duration::ZERO, Duration::from_secs(30));
        assert_eq!(
            WaitOptions::resolve(Some(&opts)),
            (Duration::from_secs(3), Duration::from_secs(30))
        );

        let opts = WaitOptions::new(Duration::from_millis(500), Duration::ZERO);
        assert_eq!(
            WaitOptions::resolve(Some(&opts)),
            (Duration::from_millis(500), Duration::from_secs(600))
        );
    }

    #[tokio::test]
    async fn terminal_on_first_retrieval() {
        let mut calls = 0;
        let started = Instant::now();
        let result = poll_until_complete(
            &CancelToken::new(),
            || {
                calls += 1;
                async { resource("verified") }
            },
            |s| s == "verified",
            "Verification ver_1",
            Some(&WaitOptions::new(Duration::from_secs(60), Duration::from_secs(120))),
        )
        .await
        .unwrap();

        assert_eq!(status_of(&result), "verified");
        assert_eq!(calls, 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn polls_until_terminal() {
        let mut calls = 0;
        let result = poll_until_complete(
            &CancelToken::new(),
            || {
                calls += 1;
                let status = if calls >= 3 { "completed" } else { "pending" };
                async move { resource(status) }
            },
            |s| s == "completed",
            "Verification request vr_1",
            Some(&fast()),
        )
        .await
        .unwrap();

        assert_eq!(status_of(&result), "completed");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn retrieval_errors_stop_the_poll() {
        let mut calls = 0;
        let err = poll_until_complete(
            &CancelToken::new(),
            || {
                calls += 1;
                async { Err::<ApiObject, _>(ProofError::from(crate::errors::classify(404, None))) }
            },
            |_| true,
            "Session sess_1",
            Some(&fast()),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn times_out_with_label_and_last_status() {
        let err = poll_until_complete(
            &CancelToken::new(),
            || async { resource("pending") },
            |s| s == "verified",
            "Verification ver_1",
            Some(&WaitOptions::new(
                Duration::from_millis(10),
                Duration::from_millis(50),
            )),
        )
        .await
        .unwrap_err();

        let api = err.as_api_error().unwrap();
        assert_eq!(api.kind(), ErrorKind::PollingTimeout);
        assert_eq!(api.code(), "polling_timeout");
        assert!(api.message().contains("Verification ver_1"));
        assert!(api.message().contains("last status: pending"));
    }

    #[tokio::test]
    async fn missing_status_is_treated_as_empty() {
        let result = poll_until_complete(
            &CancelToken::new(),
            || async { Ok::<_, ProofError>(ApiObject::new()) },
            |s| s.is_empty(),
            "Session sess_1",
            None,
        )
        .await
        .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_returns_without_waiting() {
        let token = CancelToken::new();
        token.cancel();
        let started = Instant::now();

        let err = poll_until_complete(
            &token,
            || async { resource("pending") },
            |s| s == "verified",
            "Verification ver_1",
            Some(&WaitOptions::new(Duration::from_secs(30), Duration::from_secs(60))),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProofError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn token_deadline_reports_deadline_exceeded() {
        let token = CancelToken::with_timeout(Duration::from_millis(30));
        let err = poll_until_complete(
            &token,
            || async { resource("pending") },
            |s| s == "verified",
            "Verification ver_1",
            Some(&WaitOptions::new(Duration::from_secs(30), Duration::from_secs(60))),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProofError::DeadlineExceeded));
    }
}
