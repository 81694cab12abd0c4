//! Lorebook CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use reverie_core::repository::lorebook::LorebookRepository;
use reverie_types::character::Visibility;
use reverie_types::lorebook::{LoreEntry, Lorebook};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLorebookRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entries: Vec<LoreEntry>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
}

fn default_visibility() -> Visibility {
    Visibility::Private
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateLorebookRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub entries: Option<Vec<LoreEntry>>,
    pub visibility: Option<Visibility>,
}

/// POST /api/v1/lorebooks - Create a lorebook.
pub async fn create_lorebook(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Json(body): Json<CreateLorebookRequest>,
) -> Result<(StatusCode, Json<Lorebook>), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    let now = Utc::now();
    let lorebook = Lorebook {
        id: Uuid::now_v7(),
        owner_id: user_id,
        name: body.name,
        description: body.description,
        entries: body.entries,
        visibility: body.visibility,
        created_at: now,
        updated_at: now,
    };
    state.engine.lorebooks().create(&lorebook).await?;

    Ok((StatusCode::CREATED, Json(lorebook)))
}

/// GET /api/v1/lorebooks - The caller's lorebooks.
pub async fn list_lorebooks(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
) -> Result<Json<Vec<Lorebook>>, AppError> {
    let lorebooks = state.engine.lorebooks().list_for_owner(&user_id).await?;
    Ok(Json(lorebooks))
}

/// GET /api/v1/lorebooks/{id} - Get one lorebook.
pub async fn get_lorebook(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Lorebook>, AppError> {
    let lorebook = state
        .engine
        .lorebooks()
        .get(&id)
        .await?
        .filter(|l| l.owner_id == user_id || l.visibility == Visibility::Public)
        .ok_or(AppError::NotFound("Lorebook"))?;
    Ok(Json(lorebook))
}

/// PUT /api/v1/lorebooks/{id} - Update a lorebook (owner only).
pub async fn update_lorebook(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLorebookRequest>,
) -> Result<Json<Lorebook>, AppError> {
    let mut lorebook = owned_lorebook(&state, &id, &user_id).await?;

    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        lorebook.name = name;
    }
    if let Some(description) = body.description {
        lorebook.description = description;
    }
    if let Some(entries) = body.entries {
        lorebook.entries = entries;
    }
    if let Some(visibility) = body.visibility {
        lorebook.visibility = visibility;
    }

    state.engine.lorebooks().update(&lorebook).await?;
    Ok(Json(lorebook))
}

/// DELETE /api/v1/lorebooks/{id} - Delete a lorebook (owner only).
///
/// Characters referencing the deleted book keep the dangling ID; prompt
/// composition skips unknown references.
pub async fn delete_lorebook(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    owned_lorebook(&state, &id, &user_id).await?;
    state.engine.lorebooks().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_lorebook(
    state: &AppState,
    id: &Uuid,
    user_id: &Uuid,
) -> Result<Lorebook, AppError> {
    state
        .engine
        .lorebooks()
        .get(id)
        .await?
        .filter(|l| l.owner_id == *user_id)
        .ok_or(AppError::NotFound("Lorebook"))
}
