//! Conversation handlers: create, list, and turn history.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use reverie_core::repository::character::CharacterRepository;
use reverie_core::repository::conversation::ConversationRepository;
use reverie_types::chat::{Conversation, Turn};
use reverie_types::character::Visibility;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub character_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/v1/conversations - Start a conversation with a character.
pub async fn create_conversation(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, AppError> {
    let character = state
        .engine
        .characters()
        .get(&body.character_id)
        .await?
        .filter(|c| c.owner_id == user_id || c.visibility == Visibility::Public)
        .ok_or(AppError::NotFound("Character"))?;

    let now = Utc::now();
    let conversation = Conversation {
        id: Uuid::now_v7(),
        user_id,
        character_id: character.id,
        title: body
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Chat with {}", character.name)),
        created_at: now,
        updated_at: now,
    };
    state.engine.conversations().create(&conversation).await?;

    Ok(Json(conversation))
}

/// GET /api/v1/conversations - The caller's conversations, most recent first.
pub async fn list_conversations(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<Json<Vec<Conversation>>, AppError> {
    let conversations = state.engine.conversations().list_for_user(&user_id).await?;
    Ok(Json(conversations))
}

/// GET /api/v1/conversations/{id}/messages - Full turn history, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Turn>>, AppError> {
    // Not-found and not-yours are indistinguishable to the caller
    state
        .engine
        .conversations()
        .get(&id)
        .await?
        .filter(|c| c.user_id == user_id)
        .ok_or(AppError::NotFound("Conversation"))?;

    let turns = state.engine.conversations().list_turns(&id).await?;
    Ok(Json(turns))
}
