//! SQLite memory repository implementation.

use chrono::Utc;
use reverie_core::repository::memory::MemoryRepository;
use reverie_types::error::RepositoryError;
use reverie_types::memory::Memory;
use sqlx::Row;
use uuid::Uuid;

use super::conversation::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `MemoryRepository`.
pub struct SqliteMemoryRepository {
    pool: DatabasePool,
}

impl SqliteMemoryRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct MemoryRow {
    id: String,
    user_id: String,
    character_id: String,
    content: String,
    importance: i64,
    source_turn_id: Option<String>,
    created_at: String,
    last_used: Option<String>,
}

impl MemoryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            character_id: row.try_get("character_id")?,
            content: row.try_get("content")?,
            importance: row.try_get("importance")?,
            source_turn_id: row.try_get("source_turn_id")?,
            created_at: row.try_get("created_at")?,
            last_used: row.try_get("last_used")?,
        })
    }

    fn into_memory(self) -> Result<Memory, RepositoryError> {
        Ok(Memory {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            character_id: parse_uuid(&self.character_id)?,
            content: self.content,
            importance: Memory::clamp_importance(self.importance),
            source_turn_id: self
                .source_turn_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            last_used: self
                .last_used
                .as_deref()
                .map(parse_datetime)
                .transpose()?,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryRepository impl
// ---------------------------------------------------------------------------

impl MemoryRepository for SqliteMemoryRepository {
    async fn create(&self, memory: &Memory) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO memories
               (id, user_id, character_id, content, importance, source_turn_id, created_at, last_used)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(memory.id.to_string())
        .bind(memory.user_id.to_string())
        .bind(memory.character_id.to_string())
        .bind(&memory.content)
        .bind(memory.importance as i64)
        .bind(memory.source_turn_id.as_ref().map(Uuid::to_string))
        .bind(format_datetime(&memory.created_at))
        .bind(memory.last_used.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_for_pair(
        &self,
        user_id: &Uuid,
        character_id: &Uuid,
        limit: usize,
    ) -> Result<Vec<Memory>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM memories
               WHERE user_id = ? AND character_id = ?
               ORDER BY importance DESC, created_at DESC
               LIMIT ?"#,
        )
        .bind(user_id.to_string())
        .bind(character_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut memories = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = MemoryRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            memories.push(r.into_memory()?);
        }
        Ok(memories)
    }

    async fn touch_memories(&self, ids: &[Uuid]) -> Result<(), RepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }
        let now = format_datetime(&Utc::now());
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("UPDATE memories SET last_used = ? WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql).bind(&now);
        for id in ids {
            query = query.bind(id.to_string());
        }
        query
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_for_user(&self, id: &Uuid, user_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM memories WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::tests::test_pool;

    fn make_memory(user_id: Uuid, character_id: Uuid, content: &str, importance: u8) -> Memory {
        Memory {
            id: Uuid::now_v7(),
            user_id,
            character_id,
            content: content.to_string(),
            importance,
            source_turn_id: None,
            created_at: Utc::now(),
            last_used: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_ordered_by_importance_then_recency() {
        let repo = SqliteMemoryRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let character = Uuid::now_v7();

        let low = make_memory(user, character, "low", 1);
        let mut old_high = make_memory(user, character, "old high", 5);
        old_high.created_at = Utc::now() - chrono::Duration::hours(1);
        let new_high = make_memory(user, character, "new high", 5);

        repo.create(&low).await.unwrap();
        repo.create(&old_high).await.unwrap();
        repo.create(&new_high).await.unwrap();

        let listed = repo.list_for_pair(&user, &character, 10).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].content, "new high");
        assert_eq!(listed[1].content, "old high");
        assert_eq!(listed[2].content, "low");
    }

    #[tokio::test]
    async fn test_list_respects_limit_and_pair_isolation() {
        let repo = SqliteMemoryRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let character = Uuid::now_v7();

        for i in 0..5 {
            repo.create(&make_memory(user, character, &format!("m{i}"), 3))
                .await
                .unwrap();
        }
        repo.create(&make_memory(Uuid::now_v7(), character, "other user", 5))
            .await
            .unwrap();

        let listed = repo.list_for_pair(&user, &character, 2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|m| m.user_id == user));
    }

    #[tokio::test]
    async fn test_touch_memories_sets_last_used() {
        let repo = SqliteMemoryRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let character = Uuid::now_v7();

        let touched = make_memory(user, character, "touched", 3);
        let untouched = make_memory(user, character, "untouched", 3);
        repo.create(&touched).await.unwrap();
        repo.create(&untouched).await.unwrap();

        repo.touch_memories(&[touched.id]).await.unwrap();

        let listed = repo.list_for_pair(&user, &character, 10).await.unwrap();
        let touched_row = listed.iter().find(|m| m.id == touched.id).unwrap();
        let untouched_row = listed.iter().find(|m| m.id == untouched.id).unwrap();
        assert!(touched_row.last_used.is_some());
        assert!(untouched_row.last_used.is_none());
    }

    #[tokio::test]
    async fn test_touch_memories_empty_list_is_noop() {
        let repo = SqliteMemoryRepository::new(test_pool().await);
        repo.touch_memories(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_memory() {
        let repo = SqliteMemoryRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let character = Uuid::now_v7();

        let memory = make_memory(user, character, "forget me", 2);
        repo.create(&memory).await.unwrap();

        // Someone else's ID does not match
        assert!(matches!(
            repo.delete_for_user(&memory.id, &Uuid::now_v7()).await,
            Err(RepositoryError::NotFound)
        ));

        repo.delete_for_user(&memory.id, &user).await.unwrap();

        assert!(repo
            .list_for_pair(&user, &character, 10)
            .await
            .unwrap()
            .is_empty());
    }
}
