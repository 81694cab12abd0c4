//! OpenAI-compatible chat completions adapter.
//!
//! Speaks the `/v1/chat/completions` streaming wire format, which a wide
//! range of services implement. One POST per generation; the SSE body is
//! decoded by hand and ends at the `[DONE]` sentinel.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and never appears in
//! `Debug` output or logs.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::trace;

use reverie_core::llm::ChatProvider;
use reverie_types::llm::{GenerationRequest, ProviderError, StreamChunk};

use super::sse::SseDecoder;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Provider adapter for OpenAI-compatible completion services.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    /// Create a new adapter. `base_url` is the service root without the
    /// `/v1/...` path; a trailing slash is tolerated.
    pub fn new(api_key: SecretString, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    presence_penalty: f64,
    frequency_penalty: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    stream: bool,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        reverie_types::llm::MessageRole::System => "system",
                        reverie_types::llm::MessageRole::User => "user",
                        reverie_types::llm::MessageRole::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_tokens,
            top_p: request.sampling.top_p,
            presence_penalty: request.sampling.presence_penalty,
            frequency_penalty: request.sampling.frequency_penalty,
            stop: request.sampling.stop_sequences.clone(),
            stream: true,
        }
    }
}

#[derive(Deserialize)]
struct WireChunk {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    #[serde(default)]
    delta: WireDelta,
}

#[derive(Deserialize, Default)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the text delta from one SSE payload. `None` for malformed JSON
/// or chunks without content (role-only deltas, finish chunks).
fn delta_text(payload: &str) -> Option<String> {
    let chunk: WireChunk = serde_json::from_str(payload).ok()?;
    chunk.choices.into_iter().next()?.delta.content
}

// ---------------------------------------------------------------------------
// ChatProvider impl
// ---------------------------------------------------------------------------

impl ChatProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(
        &self,
        request: GenerationRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send + 'static>> {
        let client = self.client.clone();
        let url = self.completions_url();
        let api_key = self.api_key.clone();

        Box::pin(async_stream::stream! {
            let body = match serde_json::to_value(WireRequest::from_request(&request)) {
                Ok(body) => body,
                Err(e) => {
                    yield Err(ProviderError::Request(format!("serialize request: {e}")));
                    return;
                }
            };

            let response = match client
                .post(&url)
                .bearer_auth(api_key.expose_secret())
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    yield Err(ProviderError::Request(e.to_string()));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                yield Err(ProviderError::Http {
                    status: status.as_u16(),
                    body,
                });
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ProviderError::Stream(e.to_string()));
                        return;
                    }
                };
                for payload in decoder.feed(&chunk) {
                    if payload == "[DONE]" {
                        yield Ok(StreamChunk::Done);
                        return;
                    }
                    match delta_text(&payload) {
                        Some(text) if !text.is_empty() => {
                            yield Ok(StreamChunk::Token { text });
                        }
                        // Malformed or content-less payloads are skipped.
                        _ => trace!("skipping non-content SSE payload"),
                    }
                }
            }
            // Body ended without the sentinel; treat as clean completion.
            yield Ok(StreamChunk::Done);
        })
    }
}
