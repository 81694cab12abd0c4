//! ChatProvider trait definition.
//!
//! This is the abstraction every completion backend implements. It is
//! object-safe so a resolved provider can be held as `Arc<dyn ChatProvider>`
//! and swapped per-request based on the active settings.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;

use reverie_types::llm::{GenerationRequest, ProviderError, StreamChunk};

/// Trait for streaming completion backends (OpenAI-compatible, Gemini).
///
/// Implementations live in reverie-infra. Dropping the returned stream
/// aborts the in-flight HTTP request, so cancellation is drop-driven and
/// needs no extra plumbing here.
pub trait ChatProvider: Send + Sync {
    /// Stable provider name (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Start a streaming completion. Chunks arrive in model order and the
    /// stream ends after a single `StreamChunk::Done` (or an error).
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send + 'static>>;
}

/// A provider selected for one request, paired with the model to use.
///
/// Resolution happens per-request from the settings store; nothing holds a
/// resolved provider across requests.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub provider: Arc<dyn ChatProvider>,
    pub model: String,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

impl ResolvedProvider {
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
