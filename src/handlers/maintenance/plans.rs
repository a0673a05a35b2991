use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::MaintenancePlan;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance/plans", get(list).post(create))
        .route("/api/maintenance/plans/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct PlanPayload {
    elevator_id: Uuid,
    template_id: Uuid,
    starts_on: NaiveDate,
    active: Option<bool>,
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenancePlans, Action::List)?;

    let rows = sqlx::query_as::<_, MaintenancePlan>(
        "SELECT * FROM maintenance_plans ORDER BY starts_on DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenancePlans, Action::Read)?;

    let plan = sqlx::query_as::<_, MaintenancePlan>("SELECT * FROM maintenance_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Plan not found"))?;

    Ok(Json(json!({ "success": true, "data": plan })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PlanPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::MaintenancePlans, Action::Create)?;

    let inserted = sqlx::query_as::<_, MaintenancePlan>(
        r#"
        INSERT INTO maintenance_plans (id, elevator_id, template_id, starts_on, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.elevator_id)
    .bind(payload.template_id)
    .bind(payload.starts_on)
    .bind(payload.active.unwrap_or(true))
    .fetch_one(&state.pool)
    .await;

    let plan = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown elevator or template reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": plan }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlanPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenancePlans, Action::Update)?;

    let plan = sqlx::query_as::<_, MaintenancePlan>(
        r#"
        UPDATE maintenance_plans
        SET elevator_id = $2, template_id = $3, starts_on = $4, active = COALESCE($5, active), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.elevator_id)
    .bind(payload.template_id)
    .bind(payload.starts_on)
    .bind(payload.active)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Plan not found"))?;

    Ok(Json(json!({ "success": true, "data": plan })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenancePlans, Action::Delete)?;

    let result = sqlx::query("DELETE FROM maintenance_plans WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Plan not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
