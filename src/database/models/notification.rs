use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user notification. `tag` groups notifications about the same
/// subject so newer ones can supersede older ones.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tag: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
