//! SQLite lorebook repository implementation.
//!
//! Entries persist as a JSON array column; they have no identity outside
//! their book, so updates replace the whole list.

use chrono::Utc;
use reverie_core::repository::lorebook::LorebookRepository;
use reverie_types::character::Visibility;
use reverie_types::error::RepositoryError;
use reverie_types::lorebook::{LoreEntry, Lorebook};
use sqlx::Row;
use uuid::Uuid;

use super::conversation::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `LorebookRepository`.
pub struct SqliteLorebookRepository {
    pool: DatabasePool,
}

impl SqliteLorebookRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct LorebookRow {
    id: String,
    owner_id: String,
    name: String,
    description: String,
    entries: String,
    visibility: String,
    created_at: String,
    updated_at: String,
}

impl LorebookRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            entries: row.try_get("entries")?,
            visibility: row.try_get("visibility")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_lorebook(self) -> Result<Lorebook, RepositoryError> {
        let entries: Vec<LoreEntry> = serde_json::from_str(&self.entries)
            .map_err(|e| RepositoryError::Query(format!("invalid entries JSON: {e}")))?;
        let visibility: Visibility = self
            .visibility
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Lorebook {
            id: parse_uuid(&self.id)?,
            owner_id: parse_uuid(&self.owner_id)?,
            name: self.name,
            description: self.description,
            entries,
            visibility,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn entries_json(lorebook: &Lorebook) -> Result<String, RepositoryError> {
    serde_json::to_string(&lorebook.entries)
        .map_err(|e| RepositoryError::Query(format!("serialize entries: {e}")))
}

// ---------------------------------------------------------------------------
// LorebookRepository impl
// ---------------------------------------------------------------------------

impl LorebookRepository for SqliteLorebookRepository {
    async fn create(&self, lorebook: &Lorebook) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO lorebooks
               (id, owner_id, name, description, entries, visibility, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(lorebook.id.to_string())
        .bind(lorebook.owner_id.to_string())
        .bind(&lorebook.name)
        .bind(&lorebook.description)
        .bind(entries_json(lorebook)?)
        .bind(lorebook.visibility.to_string())
        .bind(format_datetime(&lorebook.created_at))
        .bind(format_datetime(&lorebook.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Lorebook>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM lorebooks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| {
            LorebookRow::from_row(&r)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_lorebook()
        })
        .transpose()
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lorebook>, RepositoryError> {
        // One query per id keeps the caller's ordering; the reference lists
        // characters carry are short.
        let mut books = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(book) = self.get(id).await? {
                books.push(book);
            }
        }
        Ok(books)
    }

    async fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Lorebook>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM lorebooks WHERE owner_id = ? ORDER BY updated_at DESC",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut books = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = LorebookRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            books.push(r.into_lorebook()?);
        }
        Ok(books)
    }

    async fn update(&self, lorebook: &Lorebook) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE lorebooks SET
               name = ?, description = ?, entries = ?, visibility = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&lorebook.name)
        .bind(&lorebook.description)
        .bind(entries_json(lorebook)?)
        .bind(lorebook.visibility.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(lorebook.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM lorebooks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
