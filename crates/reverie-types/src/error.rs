use thiserror::Error;

use crate::llm::ProviderError;

/// Errors from repository operations (used by trait definitions in reverie-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the prompt-assembly and streaming-completion pipeline.
///
/// Cancellation is deliberately not a variant: a cancelled generation ends
/// the session stream silently, persisting nothing.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("conversation not found")]
    ConversationNotFound,

    #[error("character not found")]
    CharacterNotFound,

    #[error("no user message to regenerate from")]
    NothingToRegenerate,

    /// The active provider cannot be constructed from stored configuration.
    /// Administrator action is required; never retried.
    #[error("provider configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
