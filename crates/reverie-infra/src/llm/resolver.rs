//! Per-request provider resolution.
//!
//! Reads the active provider, model, and provider config out of a fresh
//! [`GenerationSettings`] snapshot and constructs the matching adapter.
//! Providers form a closed set: adding one means adding a variant here and
//! an adapter module, never touching call sites.

use std::sync::Arc;

use secrecy::SecretString;
use serde::Deserialize;

use reverie_core::llm::{ChatProvider, ResolvedProvider};
use reverie_types::error::ChatError;
use reverie_types::settings::GenerationSettings;

use super::gemini::GeminiProvider;
use super::openai_compat::{self, OpenAiCompatibleProvider};

pub const GEMINI_FALLBACK_MODEL: &str = "gemini-1.5-flash";

/// The closed set of completion backends.
pub enum ActiveProvider {
    OpenAiCompatible(OpenAiCompatibleProvider),
    Gemini(GeminiProvider),
}

/// Stored config for the OpenAI-compatible provider
/// (`provider_config_openai` setting, JSON).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAiConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    api_key: String,
}

/// Stored config for Gemini (`provider_config_gemini` setting, JSON).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: String,
}

/// Parse a stored provider config. Malformed or empty JSON degrades to the
/// default (empty) config, which then fails the API-key check with a clear
/// message instead of a JSON error.
fn parse_config<T: Default + for<'de> Deserialize<'de>>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Strip an accepted `models/` prefix and verify the result names a Gemini
/// model; otherwise fall back to the configured model or the default.
fn normalize_gemini_model(active_model: &str, configured: &str) -> String {
    let stripped = active_model.strip_prefix("models/").unwrap_or(active_model);
    if stripped.starts_with("gemini") {
        return stripped.to_string();
    }
    let configured = configured.strip_prefix("models/").unwrap_or(configured);
    if configured.starts_with("gemini") {
        configured.to_string()
    } else {
        GEMINI_FALLBACK_MODEL.to_string()
    }
}

/// Construct the adapter selected by `settings.active_provider`.
///
/// Unrecognized provider names resolve as OpenAI-compatible, matching the
/// seeded default. A missing or empty API key is a configuration error the
/// administrator must fix; nothing here retries.
pub fn resolve_provider(settings: &GenerationSettings) -> Result<ResolvedProvider, ChatError> {
    match settings.active_provider.as_str() {
        "gemini" => {
            let config: GeminiConfig = parse_config(&settings.provider_config_gemini);
            if config.api_key.trim().is_empty() {
                return Err(ChatError::Configuration(
                    "Gemini API key is not configured".to_string(),
                ));
            }
            let model = normalize_gemini_model(&settings.active_model, &config.model);
            Ok(ResolvedProvider {
                provider: Arc::new(ActiveProvider::Gemini(GeminiProvider::new(
                    SecretString::from(config.api_key),
                ))),
                model,
            })
        }
        _ => {
            let config: OpenAiConfig = parse_config(&settings.provider_config_openai);
            if config.api_key.trim().is_empty() {
                return Err(ChatError::Configuration(
                    "OpenAI API key is not configured".to_string(),
                ));
            }
            let base_url = if config.base_url.trim().is_empty() {
                openai_compat::DEFAULT_BASE_URL.to_string()
            } else {
                config.base_url
            };
            Ok(ResolvedProvider {
                provider: Arc::new(ActiveProvider::OpenAiCompatible(
                    OpenAiCompatibleProvider::new(SecretString::from(config.api_key), base_url),
                )),
                model: settings.active_model.clone(),
            })
        }
    }
}

impl ChatProvider for ActiveProvider {
    fn name(&self) -> &str {
        match self {
            ActiveProvider::OpenAiCompatible(p) => p.name(),
            ActiveProvider::Gemini(p) => p.name(),
        }
    }

    fn generate(
        &self,
        request: reverie_types::llm::GenerationRequest,
    ) -> std::pin::Pin<
        Box<
            dyn futures_util::Stream<
                    Item = Result<reverie_types::llm::StreamChunk, reverie_types::llm::ProviderError>,
                > + Send
                + 'static,
        >,
    > {
        match self {
            ActiveProvider::OpenAiCompatible(p) => p.generate(request),
            ActiveProvider::Gemini(p) => p.generate(request),
        }
    }
}
