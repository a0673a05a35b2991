use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use sqlx::Row;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/dashboard/summary", get(summary))
}

/// GET /api/dashboard/summary - back-office counters in one round trip
async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Dashboard, Action::Read)?;

    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM customers) AS customers,
            (SELECT COUNT(*) FROM buildings) AS buildings,
            (SELECT COUNT(*) FROM elevators) AS elevators,
            (SELECT COUNT(*) FROM elevators WHERE state = 'fault') AS elevators_in_fault,
            (SELECT COUNT(*) FROM elevators WHERE state = 'in_maintenance') AS elevators_in_maintenance,
            (SELECT COUNT(*) FROM tickets WHERE status = 'open') AS open_tickets,
            (SELECT COUNT(*) FROM technician_requests WHERE status = 'pending') AS pending_technician_requests,
            (SELECT COUNT(*) FROM invoices WHERE status = 'open' AND due_on < CURRENT_DATE) AS overdue_invoices,
            (SELECT COUNT(*) FROM maintenance_jobs
             WHERE status = 'scheduled'
               AND scheduled_on BETWEEN CURRENT_DATE AND CURRENT_DATE + 7) AS jobs_next_seven_days
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let summary = json!({
        "customers": row.try_get::<i64, _>("customers")?,
        "buildings": row.try_get::<i64, _>("buildings")?,
        "elevators": {
            "total": row.try_get::<i64, _>("elevators")?,
            "in_fault": row.try_get::<i64, _>("elevators_in_fault")?,
            "in_maintenance": row.try_get::<i64, _>("elevators_in_maintenance")?,
        },
        "open_tickets": row.try_get::<i64, _>("open_tickets")?,
        "pending_technician_requests": row.try_get::<i64, _>("pending_technician_requests")?,
        "overdue_invoices": row.try_get::<i64, _>("overdue_invoices")?,
        "jobs_next_seven_days": row.try_get::<i64, _>("jobs_next_seven_days")?,
    });

    Ok(Json(json!({ "success": true, "data": summary })))
}
