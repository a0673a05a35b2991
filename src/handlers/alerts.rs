use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/alerts", get(list))
}

/// Derived operational warning; never persisted.
#[derive(Debug, Serialize)]
struct Alert {
    kind: &'static str,
    severity: &'static str,
    message: String,
    entity_id: Uuid,
}

/// GET /api/alerts - elevators in fault, overdue invoices and jobs, parts
/// below minimum stock, all computed at read time.
async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Alerts, Action::List)?;

    let mut alerts: Vec<Alert> = Vec::new();

    let faulted = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, serial_number FROM elevators WHERE state = 'fault'",
    )
    .fetch_all(&state.pool)
    .await?;
    for (id, serial) in faulted {
        alerts.push(Alert {
            kind: "elevator_fault",
            severity: "high",
            message: format!("Elevator {} is in fault state", serial),
            entity_id: id,
        });
    }

    let overdue_invoices = sqlx::query_as::<_, (Uuid, NaiveDate)>(
        "SELECT id, due_on FROM invoices WHERE status = 'open' AND due_on < CURRENT_DATE",
    )
    .fetch_all(&state.pool)
    .await?;
    for (id, due_on) in overdue_invoices {
        alerts.push(Alert {
            kind: "invoice_overdue",
            severity: "medium",
            message: format!("Invoice due {} is unpaid", due_on),
            entity_id: id,
        });
    }

    let overdue_jobs = sqlx::query_as::<_, (Uuid, NaiveDate)>(
        r#"
        SELECT id, scheduled_on FROM maintenance_jobs
        WHERE status IN ('scheduled', 'in_progress') AND scheduled_on < CURRENT_DATE
        "#,
    )
    .fetch_all(&state.pool)
    .await?;
    for (id, scheduled_on) in overdue_jobs {
        alerts.push(Alert {
            kind: "job_overdue",
            severity: "medium",
            message: format!("Maintenance job scheduled {} is overdue", scheduled_on),
            entity_id: id,
        });
    }

    let low_stock = sqlx::query_as::<_, (Uuid, String, i64, i32)>(
        r#"
        SELECT p.id, p.sku, COALESCE(SUM(m.delta), 0)::bigint AS on_hand, p.min_stock
        FROM parts p
        LEFT JOIN part_movements m ON m.part_id = p.id
        GROUP BY p.id, p.sku, p.min_stock
        HAVING COALESCE(SUM(m.delta), 0) < p.min_stock
        "#,
    )
    .fetch_all(&state.pool)
    .await?;
    for (id, sku, on_hand, min_stock) in low_stock {
        alerts.push(Alert {
            kind: "part_low_stock",
            severity: "low",
            message: format!("Part {} has {} on hand, below minimum {}", sku, on_hand, min_stock),
            entity_id: id,
        });
    }

    Ok(Json(json!({ "success": true, "data": alerts })))
}
