//! Usage accounting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed generation: which provider/model served it and how long it took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}
