//! Reasoning oracle boundary.
//!
//! Every judgement the orchestrator needs (split or not, subtask text,
//! duplicate merging, loop similarity, execution, verification) goes through
//! one capability: [`Oracle::ask`]. Answers are free text; the [`parse`]
//! module turns them into typed verdicts with explicit defaults.

pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use parse::{
    parse_complexity, parse_similarity, parse_subtask_list, parse_unique_subtasks,
    parse_verification, ComplexityGrade, OutputSize, ParsedComplexity, ParsedSimilarity,
    ParsedVerification,
};

/// Failure to obtain an answer from the oracle.
///
/// Both variants belong to the "oracle unavailable" category: callers fall
/// back to the heuristic's documented default instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Network, auth, rate limit or any upstream failure
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish in time
    #[error("Oracle timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    /// Every oracle error is recoverable by fallback.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// External reasoning capability.
///
/// # Contract
/// - May return empty or malformed text; callers must not trust the format
/// - Must be safe to call from any task (`Send + Sync`)
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Ask with a system prompt (role, answer format) and a user prompt.
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError>;
}

/// Shared handle to an oracle.
pub type OracleRef = Arc<dyn Oracle>;

/// Oracle wrapper that bounds every call with a timeout.
pub struct TimeoutOracle {
    inner: OracleRef,
    timeout: Duration,
}

impl TimeoutOracle {
    pub fn new(inner: OracleRef, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Oracle for TimeoutOracle {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        match tokio::time::timeout(self.timeout, self.inner.ask(system_prompt, user_prompt)).await
        {
            Ok(answer) => answer,
            Err(_) => {
                tracing::warn!("Oracle call exceeded {:?}", self.timeout);
                Err(OracleError::Timeout(self.timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowOracle;

    #[async_trait]
    impl Oracle for SlowOracle {
        async fn ask(&self, _system: &str, _user: &str) -> Result<String, OracleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct EchoOracle;

    #[async_trait]
    impl Oracle for EchoOracle {
        async fn ask(&self, _system: &str, user: &str) -> Result<String, OracleError> {
            Ok(user.to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_oracle_error() {
        let oracle = TimeoutOracle::new(Arc::new(SlowOracle), Duration::from_millis(10));
        let err = oracle.ask("sys", "user").await.unwrap_err();

        assert_eq!(err, OracleError::Timeout(Duration::from_millis(10)));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_fast_calls_pass_through() {
        let oracle = TimeoutOracle::new(Arc::new(EchoOracle), Duration::from_secs(1));
        assert_eq!(oracle.ask("sys", "hello").await.unwrap(), "hello");
    }
}
