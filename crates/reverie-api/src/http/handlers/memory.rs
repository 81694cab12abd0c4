//! Memory handlers: list, create, and delete per-character memories.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use reverie_core::repository::character::CharacterRepository;
use reverie_core::repository::memory::MemoryRepository;
use reverie_types::character::Visibility;
use reverie_types::memory::Memory;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MemoryListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    pub content: String,
    /// Importance 1..=5; out-of-range values are clamped.
    #[serde(default = "default_importance")]
    pub importance: i64,
    #[serde(default)]
    pub source_turn_id: Option<Uuid>,
}

fn default_importance() -> i64 {
    3
}

/// GET /api/v1/characters/{id}/memories - The caller's memories for a character.
pub async fn list_memories(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(character_id): Path<Uuid>,
    Query(query): Query<MemoryListQuery>,
) -> Result<Json<Vec<Memory>>, AppError> {
    check_character(&state, &character_id, &user_id).await?;

    let memories = state
        .engine
        .memories()
        .list_for_pair(&user_id, &character_id, query.limit)
        .await?;
    Ok(Json(memories))
}

/// POST /api/v1/characters/{id}/memories - Save a memory about a character.
pub async fn create_memory(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(character_id): Path<Uuid>,
    Json(body): Json<CreateMemoryRequest>,
) -> Result<(StatusCode, Json<Memory>), AppError> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    check_character(&state, &character_id, &user_id).await?;

    let memory = Memory {
        id: Uuid::now_v7(),
        user_id,
        character_id,
        content: body.content,
        importance: Memory::clamp_importance(body.importance),
        source_turn_id: body.source_turn_id,
        created_at: Utc::now(),
        last_used: None,
    };
    state.engine.memories().create(&memory).await?;

    Ok((StatusCode::CREATED, Json(memory)))
}

/// DELETE /api/v1/memories/{id} - Delete one of the caller's memories.
pub async fn delete_memory(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.engine.memories().delete_for_user(&id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check_character(
    state: &AppState,
    character_id: &Uuid,
    user_id: &Uuid,
) -> Result<(), AppError> {
    state
        .engine
        .characters()
        .get(character_id)
        .await?
        .filter(|c| c.owner_id == *user_id || c.visibility == Visibility::Public)
        .ok_or(AppError::NotFound("Character"))?;
    Ok(())
}
