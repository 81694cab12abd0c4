//! ConversationRepository trait definition.
//!
//! Conversations are append-only turn logs. The only deletion the pipeline
//! performs is the single most-recent-assistant-turn removal during
//! regenerate; `delete_turn` exists for exactly that.

use chrono::{DateTime, Utc};
use reverie_types::chat::{Conversation, Turn, TurnRole};
use reverie_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and turn persistence.
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation.
    fn create(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a conversation by its unique ID.
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List a user's conversations, most recently updated first.
    fn list_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Load up to `limit` turns, most recent first.
    ///
    /// Callers restore chronological order by reversing.
    fn list_recent_turns(
        &self,
        conversation_id: &Uuid,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Load every turn in chronological order (REST history endpoint).
    fn list_turns(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Append an immutable turn to the conversation's log.
    fn append_turn(
        &self,
        conversation_id: &Uuid,
        role: TurnRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Turn, RepositoryError>> + Send;

    /// Delete a single turn by ID (regenerate only).
    fn delete_turn(
        &self,
        turn_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent user-role turn, if any.
    fn last_user_turn(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Turn>, RepositoryError>> + Send;

    /// Most recent assistant-role turn created strictly after `after`.
    fn last_assistant_turn_after(
        &self,
        conversation_id: &Uuid,
        after: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Turn>, RepositoryError>> + Send;

    /// Refresh the conversation's last-activity timestamp.
    fn touch(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
