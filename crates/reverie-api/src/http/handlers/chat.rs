//! Streaming chat handlers: send and regenerate.
//!
//! Both endpoints respond with an SSE stream of `token` events followed by a
//! single terminal `done` or `error` event. Client disconnects cancel the
//! generation through a drop guard; a cancelled stream persists nothing and
//! carries no terminal event.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use reverie_core::chat::{PreparedGeneration, SessionEvent};
use reverie_core::repository::conversation::ConversationRepository;
use reverie_infra::llm::resolve_provider;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// POST /api/v1/conversations/{id}/messages - Send a message, stream the reply.
pub async fn send_message(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    check_ownership(&state, &id, &user_id).await?;

    let prepared = state.engine.begin_send(&id, &body.message).await?;
    Ok(generation_response(state, prepared))
}

/// POST /api/v1/conversations/{id}/regenerate - Redo the last assistant reply.
pub async fn regenerate(
    State(state): State<AppState>,
    Authenticated(user_id): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    check_ownership(&state, &id, &user_id).await?;

    let prepared = state.engine.begin_regenerate(&id).await?;
    Ok(generation_response(state, prepared))
}

async fn check_ownership(
    state: &AppState,
    conversation_id: &Uuid,
    user_id: &Uuid,
) -> Result<(), AppError> {
    state
        .engine
        .conversations()
        .get(conversation_id)
        .await?
        .filter(|c| c.user_id == *user_id)
        .ok_or(AppError::NotFound("Conversation"))?;
    Ok(())
}

/// Run the prepared generation as an SSE response.
///
/// Provider resolution happens inside the stream: a misconfigured provider
/// becomes the stream's single `error` event rather than an HTTP failure,
/// so clients handle both setup and mid-stream failures the same way.
fn generation_response(
    state: AppState,
    prepared: PreparedGeneration,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let cancel = CancellationToken::new();

    let stream = async_stream::stream! {
        // Dropped when the client disconnects, cancelling the generation
        let _guard = cancel.clone().drop_guard();

        match resolve_provider(&prepared.settings) {
            Err(e) => {
                yield Ok::<_, Infallible>(error_event(&e.to_string()));
            }
            Ok(resolved) => {
                let mut events = state
                    .engine
                    .clone()
                    .stream_generation(prepared, resolved, cancel.clone());
                while let Some(event) = events.next().await {
                    yield Ok(match event {
                        SessionEvent::Token(text) => Event::default()
                            .event("token")
                            .data(json!({ "text": text }).to_string()),
                        SessionEvent::Done => Event::default().event("done").data("{}"),
                        SessionEvent::Error(message) => error_event(&message),
                    });
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn error_event(message: &str) -> Event {
    Event::default()
        .event("error")
        .data(json!({ "message": message }).to_string())
}
