// src/llm/client.rs
// Thin client for an OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

/// Why a completion call failed. Kept as a typed error so the gateway can
/// log the cause even though callers only ever see fallback text.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid API credentials")]
    InvalidCredentials,
    #[error("quota exhausted or rate limited")]
    QuotaExhausted,
    #[error("upstream HTTP error: {0}")]
    Http(String),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
    #[error("upstream call timed out")]
    Timeout,
}

/// Boundary trait for the hosted completion service. Tests substitute a
/// scripted double; production uses [`OpenAiBackend`].
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamError>;
}

pub struct OpenAiBackend {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(api_base: &str, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, UpstreamError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "temperature": 0.7,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Http(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(UpstreamError::InvalidCredentials);
            }
            StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                return Err(UpstreamError::QuotaExhausted);
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(UpstreamError::Http(format!("{}: {}", status, body)));
            }
            _ => {}
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        raw["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| UpstreamError::Malformed("no message content in response".into()))
    }
}
