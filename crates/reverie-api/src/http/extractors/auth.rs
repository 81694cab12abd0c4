//! Caller identity extractor.
//!
//! The service fronts a trusted gateway that authenticates users and
//! forwards their identity in the `X-User-Id` header. Extracting
//! `Authenticated` validates that header and yields the caller's user ID;
//! ownership checks in handlers are scoped to it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated caller. Wraps the user ID from the `X-User-Id` header.
pub struct Authenticated(pub Uuid);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get("x-user-id").ok_or_else(|| {
            AppError::Unauthorized("Missing X-User-Id header".to_string())
        })?;

        let raw = header.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-User-Id header encoding".to_string())
        })?;

        let user_id = raw.trim().parse::<Uuid>().map_err(|_| {
            AppError::Unauthorized(format!("'{raw}' is not a valid user ID"))
        })?;

        Ok(Authenticated(user_id))
    }
}
