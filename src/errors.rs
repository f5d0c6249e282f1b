use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Classification of an [`ApiError`].
///
/// Fixed at construction. The HTTP-derived variants come from [`classify`];
/// `Network` and `Timeout` are produced by the transport and `PollingTimeout`
/// by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 400.
    Validation,
    /// HTTP 401.
    Authentication,
    /// HTTP 403.
    Forbidden,
    /// HTTP 404.
    NotFound,
    /// HTTP 409.
    Conflict,
    /// HTTP 429. Auth-lockout responses also report how many attempts remain.
    RateLimit {
        retry_after: Option<u64>,
        remaining_attempts: Option<u32>,
    },
    /// HTTP 5xx.
    Server,
    /// No response was received (DNS, connection refused, malformed URL).
    Network,
    /// The caller's deadline fired or the per-request timeout elapsed.
    Timeout,
    /// `wait_for_completion` ran past its budget.
    PollingTimeout,
    /// Any other non-success status, e.g. 402 or 418.
    Api,
}

impl ErrorKind {
    /// Map a status code onto its variant. First match wins.
    fn from_status(status: u16, body: Option<&ErrorBody>) -> Self {
        match status {
            400 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimit {
                retry_after: body.and_then(|b| b.retry_after),
                remaining_attempts: body.and_then(|b| b.remaining_attempts),
            },
            s if s >= 500 => Self::Server,
            _ => Self::Api,
        }
    }
}

/// A classified failure reported by (or on the way to) the API.
///
/// Every value carries a message, a machine-readable code, and a status code.
/// Failures that never produced a response use status `0`.
#[derive(Debug, Clone, Error)]
#[error("{message} (code: {code}, status: {status_code})")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    code: String,
    status_code: u16,
    details: Option<Value>,
    request_id: Option<String>,
}

impl ApiError {
    pub(crate) fn network(message: impl Into<String>) -> Self {
        Self::local(ErrorKind::Network, "network_error", message)
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::local(ErrorKind::Timeout, "timeout", message)
    }

    pub(crate) fn polling_timeout(message: impl Into<String>) -> Self {
        Self::local(ErrorKind::PollingTimeout, "polling_timeout", message)
    }

    fn local(kind: ErrorKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: code.to_string(),
            status_code: 0,
            details: None,
            request_id: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// HTTP status, or `0` when no response was received.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Server-side request id, for support correlation.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Seconds to wait before retrying. Only set on rate-limit errors.
    pub fn retry_after(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::RateLimit { retry_after, .. } => retry_after,
            _ => None,
        }
    }

    /// Attempts left before an auth lockout. Only set on rate-limit errors.
    pub fn remaining_attempts(&self) -> Option<u32> {
        match self.kind {
            ErrorKind::RateLimit {
                remaining_attempts, ..
            } => remaining_attempts,
            _ => None,
        }
    }

    /// Whether the same request might succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimit { .. } | ErrorKind::Server | ErrorKind::Network | ErrorKind::Timeout
        )
    }
}

/// The nested `error` object of a non-2xx response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<Value>,
    pub request_id: Option<String>,
    pub retry_after: Option<u64>,
    pub remaining_attempts: Option<u32>,
}

impl ErrorBody {
    /// Extract the `error` object from a parsed response body.
    ///
    /// Returns `None` when `error` is missing or is not an object. Fields with
    /// an unexpected type are skipped rather than failing the whole body.
    pub fn from_value(body: &Value) -> Option<Self> {
        let err = body.get("error")?.as_object()?;
        let text = |key: &str| {
            err.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Some(Self {
            code: text("code"),
            message: text("message"),
            details: err.get("details").filter(|v| !v.is_null()).cloned(),
            request_id: text("request_id"),
            retry_after: err.get("retryAfter").and_then(json_seconds),
            remaining_attempts: err
                .get("remaining_attempts")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
        })
    }
}

/// Whole seconds from a JSON number; fractional values round up.
fn json_seconds(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.ceil() as u64)
    })
}

/// Turn a status code and optional error body into an [`ApiError`].
///
/// Missing or empty `code`/`message` fall back to `http_<status>` and
/// `Request failed with status <status>`.
pub fn classify(status: u16, body: Option<&ErrorBody>) -> ApiError {
    let non_empty = |s: Option<&String>| s.filter(|s| !s.is_empty()).cloned();

    let code = non_empty(body.and_then(|b| b.code.as_ref()))
        .unwrap_or_else(|| format!("http_{status}"));
    let message = non_empty(body.and_then(|b| b.message.as_ref()))
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    ApiError {
        kind: ErrorKind::from_status(status, body),
        message,
        code,
        status_code: status,
        details: body.and_then(|b| b.details.clone()),
        request_id: non_empty(body.and_then(|b| b.request_id.as_ref())),
    }
}

/// All errors that can occur when using the proof.holdings SDK.
#[derive(Error, Debug)]
pub enum ProofError {
    /// A classified API, network, or timeout failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request body could not be encoded as JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The client could not be constructed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ProofError {
    /// The classification, if this is an [`ApiError`].
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// The HTTP status, if this is an [`ApiError`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status_code()),
            _ => None,
        }
    }

    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::RateLimit { .. } => "rate_limit",
            Self::Server => "server",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::PollingTimeout => "polling_timeout",
            Self::Api => "api",
        };
        f.write_str(name)
    }
}

/// A convenience alias for `Result<T, ProofError>`.
pub type Result<T> = std::result::Result<T, ProofError>;
