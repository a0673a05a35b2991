use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Part {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub min_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signed stock delta. Stock on hand is always the sum of movements,
/// never a stored counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartMovement {
    pub id: Uuid,
    pub part_id: Uuid,
    pub delta: i32,
    pub reason: String,
    pub job_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Aggregated stock level per part, computed at read time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartStock {
    pub part_id: Uuid,
    pub sku: String,
    pub name: String,
    pub on_hand: i64,
    pub min_stock: i32,
}
