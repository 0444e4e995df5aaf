//! Grader error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a grader client.
///
/// Only `Transient` is retried; `Exhausted` marks the retry ceiling and is
/// distinguishable from the non-retryable classes so the orchestrator can
/// report why a pair failed.
#[derive(Debug, Error)]
pub enum GraderError {
    /// A failure worth retrying: timeout, rate limit, 5xx, connection loss.
    #[error("transient grader failure{}: {message}", status_suffix(.status))]
    Transient {
        /// HTTP status, when one was received.
        status: Option<u16>,
        /// What went wrong.
        message: String,
        /// Server-suggested wait before the next attempt.
        retry_after: Option<Duration>,
    },

    /// The retry ceiling was hit; wraps the final transient failure.
    #[error("grader retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Total attempts made.
        attempts: u32,
        /// The last transient error.
        #[source]
        last: Box<GraderError>,
    },

    /// Invalid or missing credentials. Never retried.
    #[error("grader authorization failed: {0}")]
    Auth(String),

    /// The request itself was malformed. Never retried.
    #[error("grader rejected the request: {0}")]
    InvalidInput(String),

    /// The grader returned a completion with no text.
    #[error("grader returned an empty completion")]
    Empty,

    /// Anything else. Never retried.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl GraderError {
    /// Create a transient error without a status code.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            status: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a transient error from an HTTP status.
    pub fn transient_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transient {
            status: Some(status),
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create an authorization error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the retry loop should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether this indicates bad credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Server-suggested wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type for grader operations.
pub type GraderResult<T> = Result<T, GraderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GraderError::transient("timeout").is_transient());
        assert!(GraderError::transient_status(503, "unavailable").is_transient());
        assert!(!GraderError::auth("bad key").is_transient());
        assert!(!GraderError::invalid_input("no messages").is_transient());
        assert!(!GraderError::Empty.is_transient());
    }

    #[test]
    fn test_exhausted_is_not_transient() {
        let err = GraderError::Exhausted {
            attempts: 3,
            last: Box::new(GraderError::transient_status(500, "boom")),
        };
        assert!(!err.is_transient());
        let s = err.to_string();
        assert!(s.contains("3 attempts"));
        assert!(s.contains("boom"));
    }

    #[test]
    fn test_retry_after() {
        let err = GraderError::Transient {
            status: Some(429),
            message: "rate limited".into(),
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(GraderError::Empty.retry_after(), None);
    }

    #[test]
    fn test_display_includes_status() {
        let err = GraderError::transient_status(502, "bad gateway");
        assert!(err.to_string().contains("HTTP 502"));
    }
}
