//! # Chat Completion Client
//!
//! OpenAI-compatible chat-completion client.
//!
//! Request: `{model, max_tokens, messages: [{role, content}]}` POSTed to the
//! configured endpoint with optional `Authorization: Bearer <key>`.
//! Response text is `choices[0].message.content`.

use super::RemediationError;
use crate::config::GenerativeConfig;
use posture_core::ChatMessage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Longest error body kept in `RemediationError::Server`.
const MAX_ERROR_BODY: usize = 512;

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Anything that turns chat messages into reply text.
pub trait CompletionBackend: Send + Sync + 'static {
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Future<Output = Result<String, RemediationError>> + Send;
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ChatClient {
    /// Build a client from the `[generative]` section.
    pub fn from_config(config: &GenerativeConfig) -> Result<Self, RemediationError> {
        if config.endpoint.trim().is_empty() {
            return Err(RemediationError::NotConfigured(
                "generative.endpoint is empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RemediationError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key: config.resolved_api_key(),
            timeout: config.timeout(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Map a non-success status to an error.
    async fn status_error(resp: reqwest::Response) -> RemediationError {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return RemediationError::Unauthorized;
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return RemediationError::RateLimited;
        }
        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        RemediationError::Server(status.as_u16(), body)
    }
}

impl CompletionBackend for ChatClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, RemediationError> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        };

        let mut req = self.http.post(&self.endpoint).json(&request);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "Sending completion request");

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                RemediationError::Timeout(self.timeout)
            } else {
                RemediationError::Connection(format!("{}: {e}", self.endpoint))
            }
        })?;

        if !resp.status().is_success() {
            return Err(Self::status_error(resp).await);
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| RemediationError::Malformed(e.to_string()))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RemediationError::Malformed("response has no choices".to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
