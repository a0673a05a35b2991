use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub elevator_id: Option<Uuid>,
    pub description: String,
    pub amount: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub amount: BigDecimal,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single logical row of workshop pricing, upserted in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PricingSettings {
    pub id: Uuid,
    pub labor_rate: BigDecimal,
    pub callout_fee: BigDecimal,
    pub parts_markup_pct: BigDecimal,
    pub updated_at: DateTime<Utc>,
}
