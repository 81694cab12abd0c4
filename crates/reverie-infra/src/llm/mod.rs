//! LLM provider adapters and resolution.

pub mod gemini;
pub mod openai_compat;
pub mod resolver;
pub mod sse;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatibleProvider;
pub use resolver::{resolve_provider, ActiveProvider};
