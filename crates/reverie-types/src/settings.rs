//! Generation settings.
//!
//! Process-wide configuration mutated only through the admin interface and
//! read fresh from the settings store on every generation request, so
//! administrative changes take effect on the very next call.

use serde::{Deserialize, Serialize};

use crate::llm::SamplingParams;

/// Setting keys as stored in the settings table.
pub mod keys {
    pub const ACTIVE_PROVIDER: &str = "active_provider";
    pub const ACTIVE_MODEL: &str = "active_model";
    pub const TEMPERATURE: &str = "temperature";
    pub const TOP_P: &str = "top_p";
    pub const TOP_K: &str = "top_k";
    pub const PRESENCE_PENALTY: &str = "presence_penalty";
    pub const FREQUENCY_PENALTY: &str = "frequency_penalty";
    pub const STOP_SEQUENCES: &str = "stop_sequences";
    pub const MAX_TOKENS: &str = "max_tokens";
    pub const CONTEXT_LIMIT: &str = "context_limit";
    pub const MEMORY_LIMIT: &str = "memory_limit";
    pub const LOREBOOK_LIMIT: &str = "lorebook_limit";
    pub const GLOBAL_SYSTEM_PREFIX: &str = "global_system_prefix";
    pub const PROVIDER_CONFIG_OPENAI: &str = "provider_config_openai";
    pub const PROVIDER_CONFIG_GEMINI: &str = "provider_config_gemini";

    /// Every key the admin interface accepts.
    pub const ALL: &[&str] = &[
        ACTIVE_PROVIDER,
        ACTIVE_MODEL,
        TEMPERATURE,
        TOP_P,
        TOP_K,
        PRESENCE_PENALTY,
        FREQUENCY_PENALTY,
        STOP_SEQUENCES,
        MAX_TOKENS,
        CONTEXT_LIMIT,
        MEMORY_LIMIT,
        LOREBOOK_LIMIT,
        GLOBAL_SYSTEM_PREFIX,
        PROVIDER_CONFIG_OPENAI,
        PROVIDER_CONFIG_GEMINI,
    ];
}

/// Snapshot of all generation-relevant settings for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub active_provider: String,
    pub active_model: String,
    pub sampling: SamplingParams,
    /// History window size, clamped to 10..=200.
    pub context_limit: usize,
    /// Max memories injected per prompt, clamped to 0..=50.
    pub memory_limit: usize,
    /// Max lore entries injected per prompt, clamped to 0..=50.
    pub lorebook_limit: usize,
    /// Prepended verbatim to every system prompt when non-empty.
    pub global_system_prefix: String,
    /// Raw provider config JSON, parsed by the provider resolver.
    pub provider_config_openai: String,
    pub provider_config_gemini: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            active_provider: "openai".to_string(),
            active_model: "gpt-3.5-turbo".to_string(),
            sampling: SamplingParams::default(),
            context_limit: 40,
            memory_limit: 8,
            lorebook_limit: 6,
            global_system_prefix: String::new(),
            provider_config_openai: String::new(),
            provider_config_gemini: String::new(),
        }
    }
}

impl GenerationSettings {
    /// Clamp a raw context-limit value into the valid window range.
    pub fn clamp_context_limit(raw: i64) -> usize {
        raw.clamp(10, 200) as usize
    }

    /// Clamp a raw retrieval cap (memory or lorebook) into range.
    pub fn clamp_retrieval_limit(raw: i64) -> usize {
        raw.clamp(0, 50) as usize
    }
}

/// Parse a stored numeric setting, falling back to `default` when the value
/// is absent or malformed.
pub fn parse_or<T: std::str::FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Parse a comma-separated stop-sequence setting.
pub fn parse_stop_sequences(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
