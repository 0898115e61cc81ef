use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;

use crate::config::InferenceSettings;
use crate::prompt::SYSTEM_PROMPT;

/// How much of an error body to carry back to the caller
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("API unreachable: {0}")]
    Unreachable(String),

    #[error("inference credential not configured (set PERPLEXITY_API_KEY)")]
    NotConfigured,
}

/// What came back from a successful completion call
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Content of the first choice's message
    Message(String),
    /// The whole response body, when it had no usable message
    Envelope(String),
}

/// A chat-completion backend
#[async_trait]
pub trait Completion: Send + Sync {
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<RawOutput, InferenceError>;
}

/// OpenAI-compatible chat-completion client (Perplexity by default)
pub struct ChatClient {
    client: reqwest::Client,
    settings: InferenceSettings,
}

impl ChatClient {
    pub fn new(client: reqwest::Client, settings: InferenceSettings) -> Self {
        Self { client, settings }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens,
        })
    }
}

#[async_trait]
impl Completion for ChatClient {
    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, prompt: &str) -> Result<RawOutput, InferenceError> {
        let api_key = self.settings.api_key.as_deref().ok_or(InferenceError::NotConfigured)?;

        debug!("Requesting completion from {} with model {}", self.endpoint(), self.settings.model);

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .timeout(self.settings.timeout)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| InferenceError::Unreachable(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| InferenceError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            warn!("Completion API returned {status}");
            return Err(InferenceError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
            });
        }

        Ok(extract_message(&body))
    }
}

/// Pull the first choice's message out of a completion body.
/// Anything unexpected is handed back whole as an envelope.
pub fn extract_message(body: &str) -> RawOutput {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return RawOutput::Envelope(body.to_string());
    };

    match json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        Some(text) => RawOutput::Message(text.trim().to_string()),
        None => {
            debug!("Completion body has no choices[0].message.content");
            RawOutput::Envelope(json.to_string())
        }
    }
}
