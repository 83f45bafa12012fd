//! Typed errors for the completion provider.

use thiserror::Error;

/// Coarse classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// HTTP 429; handled with backoff distinct from other failures.
    RateLimited,
    /// Any other non-2xx HTTP status.
    Http,
    /// Connection, DNS, or timeout failure before a status was received.
    Network,
    /// The provider answered 2xx but the body was not parseable.
    Malformed,
}

/// Error from the completion provider.
#[derive(Debug, Clone, Error)]
#[error("completion provider error ({kind:?}): {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    /// HTTP status, when one was received.
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            status: Some(429),
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: classify_http_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Network,
            status: None,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Malformed,
            status: None,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == LlmErrorKind::RateLimited
    }
}

/// Classify an HTTP status code into an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    if status == 429 {
        LlmErrorKind::RateLimited
    } else {
        LlmErrorKind::Http
    }
}
