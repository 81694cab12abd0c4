//! SQLite usage repository implementation.

use reverie_core::repository::usage::UsageRepository;
use reverie_types::error::RepositoryError;
use reverie_types::usage::UsageRecord;
use sqlx::Row;

use super::conversation::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `UsageRepository`.
pub struct SqliteUsageRepository {
    pool: DatabasePool,
}

impl SqliteUsageRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UsageRepository for SqliteUsageRepository {
    async fn record(&self, record: &UsageRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO usage_log (id, user_id, provider, model, latency_ms, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(&record.provider)
        .bind(&record.model)
        .bind(record.latency_ms as i64)
        .bind(format_datetime(&record.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<UsageRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM usage_log ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row
                .try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let user_id: String = row
                .try_get("user_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let provider: String = row
                .try_get("provider")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let model: String = row
                .try_get("model")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let latency_ms: i64 = row
                .try_get("latency_ms")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let created_at: String = row
                .try_get("created_at")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

            records.push(UsageRecord {
                id: parse_uuid(&id)?,
                user_id: parse_uuid(&user_id)?,
                provider,
                model,
                latency_ms: latency_ms as u64,
                created_at: parse_datetime(&created_at)?,
            });
        }
        Ok(records)
    }
}
