//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: CORS, tracing.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Conversations and streaming chat
        .route("/conversations", post(handlers::conversation::create_conversation))
        .route("/conversations", get(handlers::conversation::list_conversations))
        .route(
            "/conversations/{id}/messages",
            get(handlers::conversation::list_messages).post(handlers::chat::send_message),
        )
        .route(
            "/conversations/{id}/regenerate",
            post(handlers::chat::regenerate),
        )
        // Characters
        .route("/characters", post(handlers::character::create_character))
        .route("/characters", get(handlers::character::list_characters))
        .route("/characters/{id}", get(handlers::character::get_character))
        .route("/characters/{id}", put(handlers::character::update_character))
        .route("/characters/{id}", delete(handlers::character::delete_character))
        // Memories (character-scoped list/create, top-level delete)
        .route(
            "/characters/{id}/memories",
            get(handlers::memory::list_memories).post(handlers::memory::create_memory),
        )
        .route("/memories/{id}", delete(handlers::memory::delete_memory))
        // Lorebooks
        .route("/lorebooks", post(handlers::lorebook::create_lorebook))
        .route("/lorebooks", get(handlers::lorebook::list_lorebooks))
        .route("/lorebooks/{id}", get(handlers::lorebook::get_lorebook))
        .route("/lorebooks/{id}", put(handlers::lorebook::update_lorebook))
        .route("/lorebooks/{id}", delete(handlers::lorebook::delete_lorebook))
        // Admin
        .route("/admin/settings", get(handlers::admin::list_settings))
        .route("/admin/settings/{key}", put(handlers::admin::update_setting))
        .route("/admin/usage", get(handlers::admin::list_usage));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness probe, no auth.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
