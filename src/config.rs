//! Configuration management for taskfold.
//!
//! Configuration can be set via environment variables:
//! - `ORACLE_API_KEY` - Required. API key for the chat completions endpoint.
//! - `ORACLE_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to `https://openrouter.ai/api/v1`.
//! - `ORACLE_MODEL` - Optional. Model identifier. Defaults to `openai/gpt-4o-mini`.
//! - `ORACLE_TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.
//! - `ORACLE_TIMEOUT_SECS` - Optional. Per-call timeout. Defaults to `120`.
//! - `MAX_HEURISTIC_DEPTH` - Optional. Depth guard threshold. Defaults to `3`.
//! - `MAX_RECURSION_DEPTH` - Optional. Absolute safety ceiling. Defaults to `10`.
//! - `MAX_SUBTASKS` - Optional. Branching-factor cap. Defaults to `5`.
//! - `WORKER_COUNT` - Optional. Execution worker pool size. Defaults to `5`.

use std::time::Duration;

use thiserror::Error;

use crate::util::env_var_parse;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<(String, String)> for ConfigError {
    fn from((name, reason): (String, String)) -> Self {
        ConfigError::InvalidValue(name, reason)
    }
}

/// Oracle backend configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    pub model: String,

    pub temperature: f32,

    /// Upper bound for a single oracle call
    pub timeout: Duration,
}

impl OracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Limits and thresholds of the decomposition loop.
///
/// # Invariants
/// - `worker_count >= 1` after [`OrchestratorConfig::normalized`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Tasks deeper than this run atomically without asking the oracle
    pub max_heuristic_depth: u32,

    /// Tasks at or below this level run atomically regardless of anything else
    pub max_recursion_depth: u32,

    /// Hard cap on children per decomposed task
    pub max_subtasks: usize,

    pub worker_count: usize,

    /// Similarity (0-100) above which a task repeats its ancestor
    pub similarity_threshold: u8,

    /// Characters of each sibling result passed as execution context
    pub sibling_context_chars: usize,

    /// Characters of each result kept in report snapshots
    pub result_preview_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_heuristic_depth: 3,
            max_recursion_depth: 10,
            max_subtasks: 5,
            worker_count: 5,
            similarity_threshold: 85,
            sibling_context_chars: 200,
            result_preview_chars: 200,
        }
    }
}

impl OrchestratorConfig {
    /// Clamp values that would make the loop meaningless.
    pub fn normalized(mut self) -> Self {
        self.worker_count = self.worker_count.max(1);
        self.similarity_threshold = self.similarity_threshold.min(100);
        self
    }
}

/// Complete configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub oracle: OracleConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingEnvVar` if `ORACLE_API_KEY` is not set
    /// - `ConfigError::InvalidValue` if a numeric variable does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("ORACLE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ORACLE_API_KEY".to_string()))?;

        let mut oracle = OracleConfig::new(api_key);
        if let Ok(base_url) = std::env::var("ORACLE_BASE_URL") {
            oracle.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("ORACLE_MODEL") {
            oracle.model = model;
        }
        oracle.temperature = env_var_parse("ORACLE_TEMPERATURE", oracle.temperature)?;
        oracle.timeout = Duration::from_secs(env_var_parse("ORACLE_TIMEOUT_SECS", 120u64)?);

        let defaults = OrchestratorConfig::default();
        let orchestrator = OrchestratorConfig {
            max_heuristic_depth: env_var_parse("MAX_HEURISTIC_DEPTH", defaults.max_heuristic_depth)?,
            max_recursion_depth: env_var_parse("MAX_RECURSION_DEPTH", defaults.max_recursion_depth)?,
            max_subtasks: env_var_parse("MAX_SUBTASKS", defaults.max_subtasks)?,
            worker_count: env_var_parse("WORKER_COUNT", defaults.worker_count)?,
            ..defaults
        };
        if orchestrator.worker_count == 0 {
            return Err(ConfigError::InvalidValue(
                "WORKER_COUNT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            oracle,
            orchestrator: orchestrator.normalized(),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: impl Into<String>, orchestrator: OrchestratorConfig) -> Self {
        Self {
            oracle: OracleConfig::new(api_key),
            orchestrator: orchestrator.normalized(),
        }
    }
}
