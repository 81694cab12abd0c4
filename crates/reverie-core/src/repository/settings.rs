//! SettingsRepository trait definition.
//!
//! A flat string key/value store. Generation settings are re-read from it on
//! every request; nothing in the pipeline caches them.

use reverie_types::error::RepositoryError;

/// Repository trait for administrative settings.
pub trait SettingsRepository: Send + Sync {
    /// Read one setting. `None` when the key was never written.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Upsert one setting.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All settings as (key, value) pairs, ordered by key.
    fn all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<(String, String)>, RepositoryError>> + Send;
}
