//! Chat completions errors and retry policy.
//!
//! Transient failures (rate limits, 5xx, network) are retried with
//! exponential backoff; everything else fails at once. Whatever survives
//! the retry loop reaches the orchestrator as `OracleError::Unavailable`.

use std::time::Duration;

use crate::oracle::OracleError;

/// Longest wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Classification of chat completions failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// 429
    RateLimited,
    /// 5xx
    ServerError,
    /// 4xx other than 429: auth, bad request, unknown model
    ClientError,
    /// Connection refused, reset, timed out
    NetworkError,
    /// Body was not a chat completion
    ParseError,
}

impl LlmErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmErrorKind::RateLimited | LlmErrorKind::ServerError | LlmErrorKind::NetworkError
        )
    }

    fn base_delay(&self) -> Duration {
        match self {
            LlmErrorKind::RateLimited => Duration::from_secs(5),
            LlmErrorKind::ServerError => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        }
    }
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LlmErrorKind::RateLimited => "Rate limited",
            LlmErrorKind::ServerError => "Server error",
            LlmErrorKind::ClientError => "Client error",
            LlmErrorKind::NetworkError => "Network error",
            LlmErrorKind::ParseError => "Parse error",
        };
        f.write_str(name)
    }
}

/// Failure of one chat completions request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status: Option<u16>,
    pub message: String,
    /// Server-provided `Retry-After`
    pub retry_after: Option<Duration>,
}

impl LlmError {
    /// Error for a non-success HTTP status.
    pub fn http(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            kind: classify_http_status(status),
            status: Some(status),
            message: message.into(),
            retry_after,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            status: None,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status: None,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Wait before attempt number `attempt + 1`.
    ///
    /// `Retry-After` wins; otherwise `base * 2^attempt`, capped at 60s.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }
        self.kind
            .base_delay()
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }
}

impl From<LlmError> for OracleError {
    fn from(error: LlmError) -> Self {
        OracleError::Unavailable(error.to_string())
    }
}

/// Map an HTTP status to an error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

/// Retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Total time budget across all attempts
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_retry_duration: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        error.kind.is_transient() && attempt < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(400), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(401), LlmErrorKind::ClientError);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let error = LlmError::http(429, "slow down", None);

        assert_eq!(error.suggested_delay(0), Duration::from_secs(5));
        assert_eq!(error.suggested_delay(1), Duration::from_secs(10));
        assert_eq!(error.suggested_delay(2), Duration::from_secs(20));
        assert_eq!(error.suggested_delay(10), MAX_BACKOFF);
    }

    #[test]
    fn test_retry_after_respected() {
        let error = LlmError::http(429, "slow down", Some(Duration::from_secs(30)));
        assert_eq!(error.suggested_delay(0), Duration::from_secs(30));
        assert_eq!(error.suggested_delay(5), Duration::from_secs(30));
    }

    #[test]
    fn test_only_transient_errors_retry() {
        let config = RetryConfig::default();
        assert!(config.should_retry(&LlmError::network("reset"), 0));
        assert!(config.should_retry(&LlmError::http(503, "busy", None), 2));
        assert!(!config.should_retry(&LlmError::http(503, "busy", None), 3));
        assert!(!config.should_retry(&LlmError::http(401, "bad key", None), 0));
        assert!(!config.should_retry(&LlmError::parse("not json"), 0));
    }

    #[test]
    fn test_converts_to_oracle_unavailable() {
        let err: OracleError = LlmError::http(401, "bad key", None).into();
        assert_eq!(
            err,
            OracleError::Unavailable("Client error (HTTP 401): bad key".to_string())
        );
    }
}
