//! Character CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use reverie_core::repository::character::CharacterRepository;
use reverie_types::character::{CharacterProfile, PersonaFacets, Visibility};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub guidelines: String,
    #[serde(default)]
    pub example_dialogue: String,
    #[serde(default)]
    pub facets: PersonaFacets,
    #[serde(default)]
    pub lorebook_ids: Vec<Uuid>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
}

fn default_visibility() -> Visibility {
    Visibility::Private
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCharacterRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub guidelines: Option<String>,
    pub example_dialogue: Option<String>,
    pub facets: Option<PersonaFacets>,
    pub lorebook_ids: Option<Vec<Uuid>>,
    pub visibility: Option<Visibility>,
}

/// POST /api/v1/characters - Create a character.
pub async fn create_character(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<CreateCharacterRequest>,
) -> Result<(StatusCode, Json<CharacterProfile>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let now = Utc::now();
    let character = CharacterProfile {
        id: Uuid::now_v7(),
        owner_id: user_id,
        name: body.name,
        description: body.description,
        guidelines: body.guidelines,
        example_dialogue: body.example_dialogue,
        facets: body.facets,
        lorebook_ids: body.lorebook_ids,
        visibility: body.visibility,
        created_at: now,
        updated_at: now,
    };
    state.engine.characters().create(&character).await?;

    Ok((StatusCode::CREATED, Json(character)))
}

/// GET /api/v1/characters - The caller's characters plus public ones.
pub async fn list_characters(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<Json<Vec<CharacterProfile>>, AppError> {
    let characters = state.engine.characters().list_visible(&user_id).await?;
    Ok(Json(characters))
}

/// GET /api/v1/characters/{id} - Get one character.
pub async fn get_character(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<CharacterProfile>, AppError> {
    let character = visible_character(&state, &id, &user_id).await?;
    Ok(Json(character))
}

/// PUT /api/v1/characters/{id} - Update a character (owner only).
pub async fn update_character(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCharacterRequest>,
) -> Result<Json<CharacterProfile>, AppError> {
    let mut character = owned_character(&state, &id, &user_id).await?;

    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        character.name = name;
    }
    if let Some(description) = body.description {
        character.description = description;
    }
    if let Some(guidelines) = body.guidelines {
        character.guidelines = guidelines;
    }
    if let Some(example_dialogue) = body.example_dialogue {
        character.example_dialogue = example_dialogue;
    }
    if let Some(facets) = body.facets {
        character.facets = facets;
    }
    if let Some(lorebook_ids) = body.lorebook_ids {
        character.lorebook_ids = lorebook_ids;
    }
    if let Some(visibility) = body.visibility {
        character.visibility = visibility;
    }

    state.engine.characters().update(&character).await?;
    Ok(Json(character))
}

/// DELETE /api/v1/characters/{id} - Delete a character (owner only).
pub async fn delete_character(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_character(&state, &id, &user_id).await?;
    state.engine.characters().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn visible_character(
    state: &AppState,
    id: &Uuid,
    user_id: &Uuid,
) -> Result<CharacterProfile, AppError> {
    state
        .engine
        .characters()
        .get(id)
        .await?
        .filter(|c| c.owner_id == *user_id || c.visibility == Visibility::Public)
        .ok_or(AppError::NotFound("Character"))
}

async fn owned_character(
    state: &AppState,
    id: &Uuid,
    user_id: &Uuid,
) -> Result<CharacterProfile, AppError> {
    state
        .engine
        .characters()
        .get(id)
        .await?
        .filter(|c| c.owner_id == *user_id)
        .ok_or(AppError::NotFound("Character"))
}
