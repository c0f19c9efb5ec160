//! HTTP oracle with automatic retry for transient errors.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{LlmError, RetryConfig};
use super::ChatMessage;
use crate::config::OracleConfig;
use crate::oracle::{Oracle, OracleError};

/// Oracle backed by an OpenAI-compatible chat completions endpoint.
pub struct HttpOracle {
    client: Client,
    config: OracleConfig,
    retry_config: RetryConfig,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self::with_retry_config(config, RetryConfig::default())
    }

    pub fn with_retry_config(config: OracleConfig, retry_config: RetryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            retry_config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Parse Retry-After header (seconds form only).
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature: self.config.temperature,
        }
    }

    /// Execute a single request without retry.
    async fn execute_request(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {}", e))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {}", e))
                } else {
                    LlmError::network(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::http(status.as_u16(), body, retry_after));
        }

        extract_content(&body)
    }

    /// Execute a request, retrying transient failures within the time budget.
    async fn execute_with_retry(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            let error = match self.execute_request(request).await {
                Ok(content) => {
                    if attempt > 0 {
                        tracing::info!(
                            "Request succeeded after {} retries (total time: {:?})",
                            attempt,
                            start.elapsed()
                        );
                    }
                    return Ok(content);
                }
                Err(error) => error,
            };

            if !self.retry_config.should_retry(&error, attempt) {
                if attempt > 0 {
                    tracing::error!(
                        "Request failed after {} retries (total time: {:?}): {}",
                        attempt,
                        start.elapsed(),
                        error
                    );
                } else {
                    tracing::error!("Request failed (non-retryable): {}", error);
                }
                return Err(error);
            }

            let remaining = self
                .retry_config
                .max_retry_duration
                .saturating_sub(start.elapsed());
            let delay = error.suggested_delay(attempt).min(remaining);
            if delay.is_zero() {
                tracing::warn!(
                    "Retry attempt {} failed, no time remaining: {}",
                    attempt + 1,
                    error
                );
                return Err(error);
            }

            tracing::warn!(
                "Retry attempt {} failed with {}, retrying in {:?}: {}",
                attempt + 1,
                error.kind,
                delay,
                error.message
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<String, OracleError> {
        let request = self.build_request(system_prompt, user_prompt);
        Ok(self.execute_with_retry(&request).await?)
    }
}

/// First choice's content; a missing content field reads as empty text.
fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::parse(format!("Failed to parse response: {}, body: {}", e, body)))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::parse("No choices in response"))?;

    Ok(choice.message.content.unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}
