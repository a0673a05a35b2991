use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reusable checklist applied to elevators through plans.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub interval_days: i32,
    /// JSON array of task descriptions
    pub tasks: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenancePlan {
    pub id: Uuid,
    pub elevator_id: Uuid,
    pub template_id: Uuid,
    pub starts_on: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A scheduled visit. `technician_id` is the owning technician record;
/// technician-role callers are row-scoped to their own jobs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceJob {
    pub id: Uuid,
    pub plan_id: Option<Uuid>,
    pub elevator_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub scheduled_on: NaiveDate,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
