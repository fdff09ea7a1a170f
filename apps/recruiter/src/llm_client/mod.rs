//! LLM Client — the single point of entry for all language-model calls.
//!
//! Agents only see the `LanguageModel` trait. Whatever shape the transport
//! hands back (plain string, JSON envelope, raw bytes) is normalized by
//! `LlmReply::into_text` before any agent looks at it.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;
#[cfg(test)]
pub mod testing;

const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 1000;

/// Envelope keys that may carry the generated text, in lookup order.
const TEXT_KEYS: [&str; 3] = ["data", "text", "content"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM reply is not valid UTF-8: {0}")]
    Decode(String),
}

/// Raw reply from a language-model collaborator.
#[derive(Debug, Clone)]
pub enum LlmReply {
    /// The collaborator already produced plain text.
    Text(String),
    /// A JSON envelope; the text sits under `data`, `text` or `content`.
    Object(Value),
    /// Undecoded body bytes.
    Bytes(Bytes),
}

impl LlmReply {
    /// Normalizes every reply shape into one string.
    pub fn into_text(self) -> Result<String, LlmError> {
        match self {
            LlmReply::Text(text) => Ok(text),
            LlmReply::Object(value) => text_from_value(&value).ok_or(LlmError::EmptyContent),
            LlmReply::Bytes(bytes) => {
                String::from_utf8(bytes.to_vec()).map_err(|e| LlmError::Decode(e.to_string()))
            }
        }
    }
}

impl From<String> for LlmReply {
    fn from(text: String) -> Self {
        LlmReply::Text(text)
    }
}

impl From<&str> for LlmReply {
    fn from(text: &str) -> Self {
        LlmReply::Text(text.to_string())
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(text_from_value),
        // content-block arrays: take the first block that carries text
        Value::Array(items) => items.iter().find_map(text_from_value),
        _ => None,
    }
}

/// Text-in / reply-out language model. No schema is enforced on the reply;
/// structure validation belongs to the calling agent.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<LlmReply, LlmError>;

    /// Invokes the model and normalizes the reply to text.
    async fn invoke_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.invoke(prompt).await?.into_text()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Client for the internal gen-ai chat gateway.
/// Retries 429 and 5xx responses with exponential backoff.
#[derive(Clone)]
pub struct GenAiClient {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

impl GenAiClient {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
            model: model.into(),
            temperature,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            config.genai_url.clone(),
            config.genai_model.clone(),
            config.genai_temperature,
            Duration::from_secs(config.genai_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for GenAiClient {
    async fn invoke(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        let request_body = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            model: &self.model,
            temperature: self.temperature,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.url).json(&request_body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM gateway returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let body = response.bytes().await?;
            debug!("LLM call succeeded: {} bytes", body.len());

            return Ok(match serde_json::from_slice::<Value>(&body) {
                Ok(value) => LlmReply::Object(value),
                Err(_) => LlmReply::Bytes(body),
            });
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Delay before retry `attempt` (1-based): 1s, then 2s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS << attempt.saturating_sub(1))
}

/// Strips ```json ... ``` or bare ``` ... ``` code fences from LLM output.
/// An alphanumeric word on the opening fence is dropped as a language tag
/// only when something follows it; otherwise it is the payload.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_suffix("```").unwrap_or(body);

    let tag_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let after_tag = &body[tag_len..];
    if tag_len > 0 && after_tag.starts_with(char::is_whitespace) && !after_tag.trim().is_empty() {
        after_tag.trim()
    } else {
        body.trim()
    }
}
