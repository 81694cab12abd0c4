//! Google Gemini streaming adapter.
//!
//! Uses `streamGenerateContent?alt=sse`, which frames the response as SSE
//! with no terminating sentinel; the stream ends when the body does. System
//! messages collapse into `systemInstruction` and the assistant role is
//! remapped to `model`. Penalties and stop sequences have no wire
//! counterpart here and are silently omitted.
//!
//! The API key travels as a query parameter, so the request URL is never
//! logged. The key itself is wrapped in [`secrecy::SecretString`].

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::trace;

use reverie_core::llm::ChatProvider;
use reverie_types::llm::{GenerationRequest, MessageRole, ProviderError, StreamChunk};

use super::sse::SseDecoder;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Provider adapter for the Gemini generative language API.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn stream_url(&self, model: &str, key: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, key
        )
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct WireContent<'a> {
    role: &'a str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Serialize)]
struct WireInstruction {
    parts: Vec<OwnedPart>,
}

#[derive(Serialize)]
struct OwnedPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    top_p: f64,
    top_k: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireInstruction>,
    generation_config: WireGenerationConfig,
}

impl<'a> WireRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(WireInstruction {
                parts: vec![OwnedPart {
                    text: system_text.join("\n\n"),
                }],
            })
        };

        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| WireContent {
                role: match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                },
                parts: vec![WirePart { text: &m.content }],
            })
            .collect();

        Self {
            contents,
            system_instruction,
            generation_config: WireGenerationConfig {
                temperature: request.sampling.temperature,
                max_output_tokens: request.sampling.max_tokens,
                top_p: request.sampling.top_p,
                top_k: request.sampling.top_k,
            },
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireCandidateContent>,
}

#[derive(Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Deserialize)]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Extract the text fragment from one SSE payload. `None` for malformed
/// JSON or textless chunks (safety metadata, finish frames).
fn fragment_text(payload: &str) -> Option<String> {
    let response: WireResponse = serde_json::from_str(payload).ok()?;
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()?
        .text
}

// ---------------------------------------------------------------------------
// ChatProvider impl
// ---------------------------------------------------------------------------

impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(
        &self,
        request: GenerationRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send + 'static>> {
        let client = self.client.clone();
        let url = self.stream_url(&request.model, self.api_key.expose_secret());

        Box::pin(async_stream::stream! {
            let body = match serde_json::to_value(WireRequest::from_request(&request)) {
                Ok(body) => body,
                Err(e) => {
                    yield Err(ProviderError::Request(format!("serialize request: {e}")));
                    return;
                }
            };

            let response = match client.post(&url).json(&body).send().await {
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
                    match fragment_text(&payload) {
                        Some(text) if !text.is_empty() => {
                            yield Ok(StreamChunk::Token { text });
                        }
                        _ => trace!("skipping non-text SSE payload"),
                    }
                }
            }
            // No sentinel in this protocol; end of body is end of stream.
            yield Ok(StreamChunk::Done);
        })
    }
}
