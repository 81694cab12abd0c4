//! CharacterRepository trait definition.

use reverie_types::character::CharacterProfile;
use reverie_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for character profile persistence.
pub trait CharacterRepository: Send + Sync {
    /// Create a new character.
    fn create(
        &self,
        character: &CharacterProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a character by its unique ID.
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<CharacterProfile>, RepositoryError>> + Send;

    /// List characters visible to a user: their own plus public ones.
    fn list_visible(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<CharacterProfile>, RepositoryError>> + Send;

    /// Replace a character's mutable fields.
    fn update(
        &self,
        character: &CharacterProfile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a character by ID.
    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
