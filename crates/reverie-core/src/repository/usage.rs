//! UsageRepository trait definition.

use reverie_types::error::RepositoryError;
use reverie_types::usage::UsageRecord;

/// Repository trait for per-completion usage accounting.
pub trait UsageRepository: Send + Sync {
    /// Persist one usage record. Records are written only after a completion
    /// finishes successfully.
    fn record(
        &self,
        record: &UsageRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent usage records, newest first.
    fn list_recent(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<UsageRecord>, RepositoryError>> + Send;
}
