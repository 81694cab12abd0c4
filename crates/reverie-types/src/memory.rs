//! Long-term memory types.
//!
//! A memory is a user-curated fact about one (user, character) pair. Memories
//! are retrieved into prompts by keyword relevance; selecting one refreshes
//! its `last_used` timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub character_id: Uuid,
    pub content: String,
    /// Importance score from 1 (low) to 5 (critical).
    pub importance: u8,
    /// The assistant turn this memory was created from, if any.
    pub source_turn_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Refreshed whenever this memory is selected into a prompt.
    pub last_used: Option<DateTime<Utc>>,
}

impl Memory {
    /// Clamp an importance value into the valid 1..=5 range.
    pub fn clamp_importance(raw: i64) -> u8 {
        raw.clamp(1, 5) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_importance() {
        assert_eq!(Memory::clamp_importance(0), 1);
        assert_eq!(Memory::clamp_importance(3), 3);
        assert_eq!(Memory::clamp_importance(99), 5);
    }

    #[test]
    fn test_memory_serialize() {
        let memory = Memory {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            character_id: Uuid::now_v7(),
            content: "Prefers to be addressed as Captain".to_string(),
            importance: 4,
            source_turn_id: None,
            created_at: Utc::now(),
            last_used: None,
        };
        let json = serde_json::to_string(&memory).unwrap();
        assert!(json.contains("\"importance\":4"));
    }
}
