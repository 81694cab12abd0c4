//! Loading generation settings from the settings store.
//!
//! The store holds flat string key/value pairs. Every generation request
//! re-reads them, so admin changes apply to the next completion without a
//! restart. Malformed or missing values fall back to defaults rather than
//! failing the request.

use std::collections::HashMap;

use reverie_types::error::RepositoryError;
use reverie_types::llm::SamplingParams;
use reverie_types::settings::{keys, parse_or, parse_stop_sequences, GenerationSettings};

use crate::repository::SettingsRepository;

/// Build a [`GenerationSettings`] snapshot from the settings store.
pub async fn load_generation_settings<S: SettingsRepository>(
    repo: &S,
) -> Result<GenerationSettings, RepositoryError> {
    let stored: HashMap<String, String> = repo.all().await?.into_iter().collect();
    let get = |key: &str| stored.get(key).map(String::as_str);
    let defaults = GenerationSettings::default();
    let base_sampling = SamplingParams::default();

    let sampling = SamplingParams {
        temperature: parse_or(get(keys::TEMPERATURE), base_sampling.temperature),
        top_p: parse_or(get(keys::TOP_P), base_sampling.top_p),
        top_k: parse_or(get(keys::TOP_K), base_sampling.top_k),
        presence_penalty: parse_or(get(keys::PRESENCE_PENALTY), base_sampling.presence_penalty),
        frequency_penalty: parse_or(get(keys::FREQUENCY_PENALTY), base_sampling.frequency_penalty),
        stop_sequences: parse_stop_sequences(get(keys::STOP_SEQUENCES)),
        max_tokens: parse_or(get(keys::MAX_TOKENS), base_sampling.max_tokens),
    };

    Ok(GenerationSettings {
        active_provider: get(keys::ACTIVE_PROVIDER)
            .map(str::to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.active_provider),
        active_model: get(keys::ACTIVE_MODEL)
            .map(str::to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.active_model),
        sampling,
        context_limit: GenerationSettings::clamp_context_limit(parse_or(
            get(keys::CONTEXT_LIMIT),
            defaults.context_limit as i64,
        )),
        memory_limit: GenerationSettings::clamp_retrieval_limit(parse_or(
            get(keys::MEMORY_LIMIT),
            defaults.memory_limit as i64,
        )),
        lorebook_limit: GenerationSettings::clamp_retrieval_limit(parse_or(
            get(keys::LOREBOOK_LIMIT),
            defaults.lorebook_limit as i64,
        )),
        global_system_prefix: get(keys::GLOBAL_SYSTEM_PREFIX).unwrap_or("").to_string(),
        provider_config_openai: get(keys::PROVIDER_CONFIG_OPENAI).unwrap_or("").to_string(),
        provider_config_gemini: get(keys::PROVIDER_CONFIG_GEMINI).unwrap_or("").to_string(),
    })
}
