//! Admin handlers: generation settings and usage history.
//!
//! Settings writes take effect on the next generation request; nothing is
//! cached between requests.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use reverie_core::repository::settings::SettingsRepository;
use reverie_core::repository::usage::UsageRepository;
use reverie_types::settings::keys;
use reverie_types::usage::UsageRecord;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    #[serde(default = "default_usage_limit")]
    pub limit: u32,
}

fn default_usage_limit() -> u32 {
    100
}

/// GET /api/v1/admin/settings - All settings as a key/value map.
pub async fn list_settings(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    let settings: BTreeMap<String, String> =
        state.engine.settings().all().await?.into_iter().collect();
    Ok(Json(settings))
}

/// PUT /api/v1/admin/settings/{key} - Set one setting.
///
/// Unknown keys are rejected; values are stored verbatim and validated
/// (clamped, defaulted) at read time by the settings loader.
pub async fn update_setting(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(key): Path<String>,
    Json(body): Json<UpdateSettingRequest>,
) -> Result<Json<Value>, AppError> {
    if !keys::ALL.contains(&key.as_str()) {
        return Err(AppError::Validation(format!("unknown setting key: '{key}'")));
    }

    state.engine.settings().set(&key, &body.value).await?;
    Ok(Json(json!({ "key": key, "value": body.value })))
}

/// GET /api/v1/admin/usage - Recent generation usage, newest first.
pub async fn list_usage(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<UsageQuery>,
) -> Result<Json<Vec<UsageRecord>>, AppError> {
    let records = state.engine.usage().list_recent(query.limit).await?;
    Ok(Json(records))
}
