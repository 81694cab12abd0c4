//! LLM request and streaming wire types.
//!
//! These types model the provider-agnostic contract: a `GenerationRequest`
//! goes in, a lazy stream of `StreamChunk`s comes out, terminated by an
//! explicit `Done` marker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message in a composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a composed prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Sampling parameters forwarded to a provider.
///
/// Parameters a given provider does not support are silently omitted from
/// its request rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub stop_sequences: Vec<String>,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 40,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stop_sequences: Vec::new(),
            max_tokens: 512,
        }
    }
}

/// A full streaming completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub sampling: SamplingParams,
}

/// One element of a provider's token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// An incremental fragment of generated text.
    Token { text: String },
    /// End-of-stream marker. No further chunks follow.
    Done,
}

/// Errors from provider adapters.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Upstream returned a non-2xx status; `body` is the raw error payload.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent at all.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The response body ended or broke mid-stream.
    #[error("provider stream error: {0}")]
    Stream(String),
}
