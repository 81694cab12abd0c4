//! Application state wiring the chat engine to its SQLite repositories.
//!
//! The engine is generic over repository traits; AppState pins it to the
//! concrete infra implementations and holds it in an `Arc` so SSE streams
//! can outlive the request handler that started them.

use std::sync::Arc;

use reverie_core::chat::ChatEngine;
use reverie_infra::sqlite::pool::{default_database_url, resolve_data_dir};
use reverie_infra::sqlite::{
    DatabasePool, SqliteCharacterRepository, SqliteConversationRepository,
    SqliteLorebookRepository, SqliteMemoryRepository, SqliteSettingsRepository,
    SqliteUsageRepository,
};

/// The chat engine pinned to the SQLite repository implementations.
pub type ConcreteChatEngine = ChatEngine<
    SqliteConversationRepository,
    SqliteCharacterRepository,
    SqliteMemoryRepository,
    SqliteLorebookRepository,
    SqliteSettingsRepository,
    SqliteUsageRepository,
>;

/// Shared application state used by all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteChatEngine>,
}

impl AppState {
    /// Initialize the application state: connect to the database, seed
    /// default settings, wire the engine.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(&default_database_url()).await?;
        tracing::debug!(data_dir = %data_dir.display(), "database ready");

        let settings = SqliteSettingsRepository::new(db_pool.clone());
        settings.ensure_defaults().await?;

        let engine = ChatEngine::new(
            SqliteConversationRepository::new(db_pool.clone()),
            SqliteCharacterRepository::new(db_pool.clone()),
            SqliteMemoryRepository::new(db_pool.clone()),
            SqliteLorebookRepository::new(db_pool.clone()),
            settings,
            SqliteUsageRepository::new(db_pool.clone()),
        );

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}
