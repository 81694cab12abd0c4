//! MemoryRepository trait definition.

use reverie_types::error::RepositoryError;
use reverie_types::memory::Memory;
use uuid::Uuid;

/// Repository trait for long-term memory persistence.
pub trait MemoryRepository: Send + Sync {
    /// Save a new memory entry.
    fn create(
        &self,
        memory: &Memory,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Memories for one (user, character) pair, ordered by importance DESC,
    /// created_at DESC, capped at `limit`.
    fn list_for_pair(
        &self,
        user_id: &Uuid,
        character_id: &Uuid,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Memory>, RepositoryError>> + Send;

    /// Refresh `last_used` to now for every listed memory.
    fn touch_memories(
        &self,
        ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a memory entry owned by `user_id`. Errors with `NotFound` when
    /// no such memory exists for that user.
    fn delete_for_user(
        &self,
        id: &Uuid,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
