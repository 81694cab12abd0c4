//! SQLite settings repository implementation.
//!
//! A flat key/value table. `ensure_defaults` seeds every generation setting
//! at startup with `INSERT OR IGNORE`, so existing admin overrides survive
//! restarts.

use reverie_core::repository::settings::SettingsRepository;
use reverie_types::error::RepositoryError;
use reverie_types::llm::SamplingParams;
use reverie_types::settings::{keys, GenerationSettings};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SettingsRepository`.
pub struct SqliteSettingsRepository {
    pool: DatabasePool,
}

impl SqliteSettingsRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Seed default values for every known setting key that is not already
    /// present. Called once at startup.
    pub async fn ensure_defaults(&self) -> Result<(), RepositoryError> {
        let defaults = GenerationSettings::default();
        let sampling = SamplingParams::default();
        // Provider configs seed as fill-in templates so they show up in the
        // admin settings list with an empty api key.
        let openai_template = serde_json::json!({
            "baseUrl": crate::llm::openai_compat::DEFAULT_BASE_URL,
            "apiKey": "",
        })
        .to_string();
        let gemini_template = serde_json::json!({
            "apiKey": "",
            "model": crate::llm::resolver::GEMINI_FALLBACK_MODEL,
        })
        .to_string();
        let seed: [(&str, String); 15] = [
            (keys::ACTIVE_PROVIDER, defaults.active_provider),
            (keys::ACTIVE_MODEL, defaults.active_model),
            (keys::TEMPERATURE, sampling.temperature.to_string()),
            (keys::TOP_P, sampling.top_p.to_string()),
            (keys::TOP_K, sampling.top_k.to_string()),
            (keys::PRESENCE_PENALTY, sampling.presence_penalty.to_string()),
            (
                keys::FREQUENCY_PENALTY,
                sampling.frequency_penalty.to_string(),
            ),
            (keys::STOP_SEQUENCES, String::new()),
            (keys::MAX_TOKENS, sampling.max_tokens.to_string()),
            (keys::CONTEXT_LIMIT, defaults.context_limit.to_string()),
            (keys::MEMORY_LIMIT, defaults.memory_limit.to_string()),
            (keys::LOREBOOK_LIMIT, defaults.lorebook_limit.to_string()),
            (keys::GLOBAL_SYSTEM_PREFIX, String::new()),
            (keys::PROVIDER_CONFIG_OPENAI, openai_template),
            (keys::PROVIDER_CONFIG_GEMINI, gemini_template),
        ];

        for (key, value) in &seed {
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| {
            r.try_get::<String, _>("value")
                .map_err(|e| RepositoryError::Query(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO settings (key, value) VALUES (?, ?)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, String)>, RepositoryError> {
        let rows = sqlx::query("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let key: String = row
                .try_get("key")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let value: String = row
                .try_get("value")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::tests::test_pool;

    #[tokio::test]
    async fn test_get_missing_key() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        assert!(repo.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        repo.set(keys::ACTIVE_PROVIDER, "gemini").await.unwrap();
        assert_eq!(
            repo.get(keys::ACTIVE_PROVIDER).await.unwrap().as_deref(),
            Some("gemini")
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        repo.set(keys::TEMPERATURE, "0.5").await.unwrap();
        repo.set(keys::TEMPERATURE, "1.2").await.unwrap();
        assert_eq!(
            repo.get(keys::TEMPERATURE).await.unwrap().as_deref(),
            Some("1.2")
        );
    }

    #[tokio::test]
    async fn test_ensure_defaults_seeds_without_clobbering() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        repo.set(keys::CONTEXT_LIMIT, "120").await.unwrap();

        repo.ensure_defaults().await.unwrap();

        // Existing override kept, missing keys seeded.
        assert_eq!(
            repo.get(keys::CONTEXT_LIMIT).await.unwrap().as_deref(),
            Some("120")
        );
        assert_eq!(
            repo.get(keys::ACTIVE_PROVIDER).await.unwrap().as_deref(),
            Some("openai")
        );
        assert_eq!(
            repo.get(keys::MAX_TOKENS).await.unwrap().as_deref(),
            Some("512")
        );
    }

    #[tokio::test]
    async fn test_ensure_defaults_seeds_every_known_key() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        repo.ensure_defaults().await.unwrap();

        let stored = repo.all().await.unwrap();
        assert_eq!(stored.len(), keys::ALL.len());
        for key in keys::ALL {
            assert!(
                stored.iter().any(|(k, _)| k == key),
                "missing seed for '{key}'"
            );
        }

        // Provider configs seed as fill-in templates with an empty api key.
        let openai = repo
            .get(keys::PROVIDER_CONFIG_OPENAI)
            .await
            .unwrap()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&openai).unwrap();
        assert_eq!(parsed["baseUrl"], "https://api.openai.com");
        assert_eq!(parsed["apiKey"], "");

        let gemini = repo
            .get(keys::PROVIDER_CONFIG_GEMINI)
            .await
            .unwrap()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&gemini).unwrap();
        assert_eq!(parsed["model"], "gemini-1.5-flash");
        assert_eq!(parsed["apiKey"], "");
    }

    #[tokio::test]
    async fn test_all_returns_sorted_pairs() {
        let repo = SqliteSettingsRepository::new(test_pool().await);
        repo.set("b_key", "2").await.unwrap();
        repo.set("a_key", "1").await.unwrap();

        let pairs = repo.all().await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a_key".to_string(), "1".to_string()),
                ("b_key".to_string(), "2".to_string()),
            ]
        );
    }
}
