//! Lorebook types.
//!
//! A lorebook is an ordered list of keyword-triggered facts. Entries have no
//! identity outside their book; they persist as a JSON array column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::Visibility;

/// One keyword-triggered fact inside a lorebook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoreEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Comma- or newline-delimited trigger phrases. Empty means "always".
    #[serde(default)]
    pub keywords: String,
}

impl LoreEntry {
    /// Declared trigger phrases: split on commas/newlines, trimmed, lowercased.
    pub fn declared_keywords(&self) -> Vec<String> {
        self.keywords
            .split(|c| c == ',' || c == '\n')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// A user-owned collection of lore entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lorebook {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub entries: Vec<LoreEntry>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
