//! API token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-user API key, sent as `Authorization: Token <key>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Generate a fresh token for a user (40 hex characters)
    pub fn generate(user_id: i64) -> Self {
        let a = Uuid::new_v4().simple().to_string();
        let b = Uuid::new_v4().simple().to_string();
        Self {
            key: format!("{}{}", a, &b[..8]),
            user_id,
            created_at: Utc::now(),
        }
    }
}
