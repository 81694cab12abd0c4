//! SQLite character repository implementation.
//!
//! Persona facets and the lorebook-id reference list persist as JSON text
//! columns; the row type handles (de)serialization.

use chrono::Utc;
use reverie_core::repository::character::CharacterRepository;
use reverie_types::character::{CharacterProfile, PersonaFacets, Visibility};
use reverie_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::conversation::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `CharacterRepository`.
pub struct SqliteCharacterRepository {
    pool: DatabasePool,
}

impl SqliteCharacterRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row type
// ---------------------------------------------------------------------------

struct CharacterRow {
    id: String,
    owner_id: String,
    name: String,
    description: String,
    guidelines: String,
    example_dialogue: String,
    facets: String,
    lorebook_ids: String,
    visibility: String,
    created_at: String,
    updated_at: String,
}

impl CharacterRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            guidelines: row.try_get("guidelines")?,
            example_dialogue: row.try_get("example_dialogue")?,
            facets: row.try_get("facets")?,
            lorebook_ids: row.try_get("lorebook_ids")?,
            visibility: row.try_get("visibility")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_character(self) -> Result<CharacterProfile, RepositoryError> {
        let facets: PersonaFacets = serde_json::from_str(&self.facets)
            .map_err(|e| RepositoryError::Query(format!("invalid facets JSON: {e}")))?;
        let lorebook_strings: Vec<String> = serde_json::from_str(&self.lorebook_ids)
            .map_err(|e| RepositoryError::Query(format!("invalid lorebook_ids JSON: {e}")))?;
        let lorebook_ids = lorebook_strings
            .iter()
            .map(|s| parse_uuid(s))
            .collect::<Result<Vec<Uuid>, _>>()?;
        let visibility: Visibility = self
            .visibility
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(CharacterProfile {
            id: parse_uuid(&self.id)?,
            owner_id: parse_uuid(&self.owner_id)?,
            name: self.name,
            description: self.description,
            guidelines: self.guidelines,
            example_dialogue: self.example_dialogue,
            facets,
            lorebook_ids,
            visibility,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn facets_json(character: &CharacterProfile) -> Result<String, RepositoryError> {
    serde_json::to_string(&character.facets)
        .map_err(|e| RepositoryError::Query(format!("serialize facets: {e}")))
}

fn lorebook_ids_json(character: &CharacterProfile) -> Result<String, RepositoryError> {
    let strings: Vec<String> = character.lorebook_ids.iter().map(Uuid::to_string).collect();
    serde_json::to_string(&strings)
        .map_err(|e| RepositoryError::Query(format!("serialize lorebook_ids: {e}")))
}

// ---------------------------------------------------------------------------
// CharacterRepository impl
// ---------------------------------------------------------------------------

impl CharacterRepository for SqliteCharacterRepository {
    async fn create(&self, character: &CharacterProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO characters
               (id, owner_id, name, description, guidelines, example_dialogue,
                facets, lorebook_ids, visibility, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(character.id.to_string())
        .bind(character.owner_id.to_string())
        .bind(&character.name)
        .bind(&character.description)
        .bind(&character.guidelines)
        .bind(&character.example_dialogue)
        .bind(facets_json(character)?)
        .bind(lorebook_ids_json(character)?)
        .bind(character.visibility.to_string())
        .bind(format_datetime(&character.created_at))
        .bind(format_datetime(&character.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<CharacterProfile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM characters WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| {
            CharacterRow::from_row(&r)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_character()
        })
        .transpose()
    }

    async fn list_visible(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<CharacterProfile>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM characters
               WHERE owner_id = ? OR visibility = 'public'
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut characters = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = CharacterRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            characters.push(r.into_character()?);
        }
        Ok(characters)
    }

    async fn update(&self, character: &CharacterProfile) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE characters SET
               name = ?, description = ?, guidelines = ?, example_dialogue = ?,
               facets = ?, lorebook_ids = ?, visibility = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&character.name)
        .bind(&character.description)
        .bind(&character.guidelines)
        .bind(&character.example_dialogue)
        .bind(facets_json(character)?)
        .bind(lorebook_ids_json(character)?)
        .bind(character.visibility.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(character.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM characters WHERE id = ?")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::tests::test_pool;

    fn make_character(owner_id: Uuid, visibility: Visibility) -> CharacterProfile {
        CharacterProfile {
            id: Uuid::now_v7(),
            owner_id,
            name: "Mira".to_string(),
            description: "A lighthouse keeper".to_string(),
            guidelines: "Stay dry-witted".to_string(),
            example_dialogue: String::new(),
            facets: PersonaFacets {
                persona: "Weathered".to_string(),
                voice: "clipped".to_string(),
                ..Default::default()
            },
            lorebook_ids: vec![Uuid::now_v7()],
            visibility,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrips_json_columns() {
        let repo = SqliteCharacterRepository::new(test_pool().await);
        let character = make_character(Uuid::now_v7(), Visibility::Private);

        repo.create(&character).await.unwrap();

        let fetched = repo.get(&character.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Mira");
        assert_eq!(fetched.facets.persona, "Weathered");
        assert_eq!(fetched.facets.voice, "clipped");
        assert_eq!(fetched.lorebook_ids, character.lorebook_ids);
        assert_eq!(fetched.visibility, Visibility::Private);
    }

    #[tokio::test]
    async fn test_list_visible_includes_own_and_public() {
        let repo = SqliteCharacterRepository::new(test_pool().await);
        let user = Uuid::now_v7();
        let stranger = Uuid::now_v7();

        repo.create(&make_character(user, Visibility::Private))
            .await
            .unwrap();
        repo.create(&make_character(stranger, Visibility::Public))
            .await
            .unwrap();
        repo.create(&make_character(stranger, Visibility::Private))
            .await
            .unwrap();

        let visible = repo.list_visible(&user).await.unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let repo = SqliteCharacterRepository::new(test_pool().await);
        let mut character = make_character(Uuid::now_v7(), Visibility::Private);
        repo.create(&character).await.unwrap();

        character.name = "Captain Mira".to_string();
        character.facets.goals = "Keep the light burning".to_string();
        repo.update(&character).await.unwrap();

        let fetched = repo.get(&character.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Captain Mira");
        assert_eq!(fetched.facets.goals, "Keep the light burning");
    }

    #[tokio::test]
    async fn test_update_missing_character_is_not_found() {
        let repo = SqliteCharacterRepository::new(test_pool().await);
        let character = make_character(Uuid::now_v7(), Visibility::Private);
        let err = repo.update(&character).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_character() {
        let repo = SqliteCharacterRepository::new(test_pool().await);
        let character = make_character(Uuid::now_v7(), Visibility::Private);
        repo.create(&character).await.unwrap();

        repo.delete(&character.id).await.unwrap();
        assert!(repo.get(&character.id).await.unwrap().is_none());
    }
}
