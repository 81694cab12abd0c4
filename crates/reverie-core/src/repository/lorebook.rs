//! LorebookRepository trait definition.

use reverie_types::error::RepositoryError;
use reverie_types::lorebook::Lorebook;
use uuid::Uuid;

/// Repository trait for lorebook persistence.
pub trait LorebookRepository: Send + Sync {
    /// Create a new lorebook.
    fn create(
        &self,
        lorebook: &Lorebook,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a lorebook by its unique ID.
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Lorebook>, RepositoryError>> + Send;

    /// Fetch lorebooks by ID, preserving the order of `ids`.
    ///
    /// Unknown IDs are skipped silently (a character may reference a book
    /// its owner has since deleted).
    fn list_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<Vec<Lorebook>, RepositoryError>> + Send;

    /// List a user's own lorebooks.
    fn list_for_owner(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Lorebook>, RepositoryError>> + Send;

    /// Replace a lorebook's mutable fields (including its entry list).
    fn update(
        &self,
        lorebook: &Lorebook,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a lorebook by ID.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
