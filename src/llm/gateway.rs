//! Completion gateway — one HTTP request per extraction.
//!
//! [`OllamaGateway`] calls the Ollama native `/api/generate` endpoint with a
//! bounded timeout and fixed low-temperature sampling. All failure modes
//! (non-200 status, connection error, timeout) collapse into [`LlmError`];
//! the caller drops the message rather than retrying.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::LlmConfig;

/// Per-request timeout. Fixed at the call site — the LLM is local and either
/// answers within this window or the message is dropped.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Low temperature keeps the JSON output deterministic.
const TEMPERATURE: f32 = 0.3;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during a completion request.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within [`REQUEST_TIMEOUT`].
    #[error("LLM request timed out")]
    Timeout,

    /// The endpoint answered with a non-200 status.
    #[error("LLM endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body could not be read as JSON.
    #[error("failed to read LLM response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// LlmGateway trait
// ---------------------------------------------------------------------------

/// Async completion contract: one prompt in, raw model text out.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn LlmGateway>` between the pipeline worker and tests.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// OllamaGateway
// ---------------------------------------------------------------------------

/// Calls the Ollama native `POST /api/generate` endpoint.
///
/// Stateless across invocations — the only held state is the pooled
/// `reqwest::Client`. Connection details come exclusively from the
/// [`LlmConfig`] passed to [`OllamaGateway::from_config`].
pub struct OllamaGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGateway {
    /// Build a gateway from service config.
    ///
    /// The HTTP client is pre-configured with [`REQUEST_TIMEOUT`]. A default
    /// (no-timeout) client is used as a last-resort fallback if the builder
    /// fails (should never happen in practice).
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    /// Send `prompt` to the completion endpoint and return the generated
    /// text, trimmed of surrounding whitespace.
    ///
    /// A body without a `response` field yields an empty string — the parser
    /// turns that into the fallback record downstream.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "temperature": TEMPERATURE,
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LlmError::Status(status.as_u16()));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Body(e.to_string()))?;

        let text = json
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> LlmConfig {
        LlmConfig {
            host: "localhost".into(),
            port: 11434,
            model: "phi".into(),
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _gateway = OllamaGateway::from_config(&make_config());
    }

    #[test]
    fn request_timeout_is_thirty_seconds() {
        assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(30));
    }

    /// Verify that `OllamaGateway` is usable as `dyn LlmGateway`.
    #[test]
    fn gateway_is_object_safe() {
        let gateway: Box<dyn LlmGateway> = Box::new(OllamaGateway::from_config(&make_config()));
        drop(gateway);
    }
}
