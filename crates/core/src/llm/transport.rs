//! # Completion Transport
//!
//! A transport performs exactly one request against the generation service
//! and reports failures pre-classified, so the retry policy above it never
//! needs to inspect wire details.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single completion request
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network trouble, rate limiting, or a server-side hiccup - worth
    /// retrying after a pause.
    #[error("transient upstream failure: {0}")]
    Transient(String),
    /// Anything else (bad credentials, malformed request, protocol
    /// violation) - retrying would only repeat the failure.
    #[error("upstream request failed: {0}")]
    Fatal(String),
}

/// One logical completion request against the generation service.
///
/// Implementations must be stateless between calls; the same transport is
/// shared by every concurrent session.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send `prompt` as a single user message and return the raw completion
    /// text. The model is asked for a JSON object; parsing is the caller's
    /// concern.
    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;
}

/// HTTP status codes that warrant a backed-off retry
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Configuration for [`HttpCompletionTransport`]
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// OpenAI-compatible API root, e.g. `https://api.groq.com/openai/v1`
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,
}

impl TransportConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_MODEL: &'static str = "llama-3.3-70b-versatile";

    /// Load configuration from the environment.
    ///
    /// `GROQ_API_KEY` is required; `LLM_BASE_URL` and `LLM_MODEL` override
    /// the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| anyhow::anyhow!("GROQ_API_KEY is not set"))?;
        let base_url =
            std::env::var("LLM_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());
        Ok(Self {
            base_url,
            api_key,
            model,
            ..Self::with_api_key(String::new())
        })
    }

    /// Config with defaults and an explicit key (primarily for wiring tests)
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Production transport speaking the OpenAI-compatible chat-completions API
pub struct HttpCompletionTransport {
    http: reqwest::Client,
    config: TransportConfig,
}

impl HttpCompletionTransport {
    pub fn new(config: TransportConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            // Connection refused, DNS failure, timeout - all transient.
            .map_err(|e| TransportError::Transient(e.to_string()))?;

        let status = response.status();
        if is_retryable_status(status) {
            return Err(TransportError::Transient(format!(
                "generation service returned {status}"
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransportError::Fatal(format!(
                "generation service returned {status}: {detail}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| TransportError::Transient(format!("failed to read response body: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TransportError::Fatal("completion carried no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_completion_body_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"{\"task\":\"x\"}"}}]}"#;
        let completion: ChatCompletion = serde_json::from_str(raw).unwrap();
        assert_eq!(completion.choices[0].message.content, "{\"task\":\"x\"}");
    }

    #[test]
    fn test_config_defaults() {
        let config = TransportConfig::with_api_key("k".to_string());
        assert!(config.base_url.contains("groq"));
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }
}
