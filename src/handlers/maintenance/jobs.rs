use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::MaintenanceJob;
use crate::error::ApiError;
use crate::handlers::technicians::technician_id_for_user;
use crate::policy::{authorize, Action, Resource, Role, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance/jobs", get(list).post(create))
        .route("/api/maintenance/jobs/:id", get(show).put(update).delete(remove))
}

const JOB_STATUSES: &[&str] = &["scheduled", "in_progress", "done", "cancelled"];

/// Technician callers are scoped to jobs referencing their own record.
async fn job_scope(state: &AppState, claims: &Claims) -> Result<TenantScope, ApiError> {
    let technician_id = match claims.role {
        Role::Technician => technician_id_for_user(&state.pool, claims.sub).await?,
        _ => None,
    };
    Ok(TenantScope::technician_owned(claims, technician_id))
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceJobs, Action::List)?;
    let scope = job_scope(&state, &claims).await?;

    let rows = sqlx::query_as::<_, MaintenanceJob>(
        r#"
        SELECT * FROM maintenance_jobs
        WHERE ($1::uuid IS NULL OR technician_id = $1)
        ORDER BY scheduled_on
        "#,
    )
    .bind(scope.technician_param())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceJobs, Action::Read)?;
    let scope = job_scope(&state, &claims).await?;

    let job = sqlx::query_as::<_, MaintenanceJob>(
        "SELECT * FROM maintenance_jobs WHERE id = $1 AND ($2::uuid IS NULL OR technician_id = $2)",
    )
    .bind(id)
    .bind(scope.technician_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(json!({ "success": true, "data": job })))
}

#[derive(Debug, Deserialize)]
struct CreateJobPayload {
    plan_id: Option<Uuid>,
    elevator_id: Uuid,
    technician_id: Option<Uuid>,
    scheduled_on: NaiveDate,
    notes: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::MaintenanceJobs, Action::Create)?;

    let inserted = sqlx::query_as::<_, MaintenanceJob>(
        r#"
        INSERT INTO maintenance_jobs (id, plan_id, elevator_id, technician_id, scheduled_on, status, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'scheduled', $6, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.plan_id)
    .bind(payload.elevator_id)
    .bind(payload.technician_id)
    .bind(payload.scheduled_on)
    .bind(&payload.notes)
    .fetch_one(&state.pool)
    .await;

    let job = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown plan, elevator or technician reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": job }))))
}

#[derive(Debug, Deserialize)]
struct UpdateJobPayload {
    status: Option<String>,
    notes: Option<String>,
    /// Reassignment fields, back office only
    technician_id: Option<Uuid>,
    scheduled_on: Option<NaiveDate>,
}

/// PUT /api/maintenance/jobs/:id - technicians progress their own jobs;
/// reassignment and rescheduling stay with the back office.
async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceJobs, Action::Update)?;

    if let Some(status) = payload.status.as_deref() {
        if !JOB_STATUSES.contains(&status) {
            return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
        }
    }

    if claims.role == Role::Technician
        && (payload.technician_id.is_some() || payload.scheduled_on.is_some())
    {
        return Err(ApiError::forbidden("Technicians cannot reassign or reschedule jobs"));
    }

    let scope = job_scope(&state, &claims).await?;

    // completed_at follows the status edge into done
    let job = sqlx::query_as::<_, MaintenanceJob>(
        r#"
        UPDATE maintenance_jobs
        SET status = COALESCE($2, status),
            notes = COALESCE($3, notes),
            technician_id = COALESCE($4, technician_id),
            scheduled_on = COALESCE($5, scheduled_on),
            completed_at = CASE WHEN $2 = 'done' THEN now() ELSE completed_at END,
            updated_at = now()
        WHERE id = $1 AND ($6::uuid IS NULL OR technician_id = $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.status)
    .bind(&payload.notes)
    .bind(payload.technician_id)
    .bind(payload.scheduled_on)
    .bind(scope.technician_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(json!({ "success": true, "data": job })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceJobs, Action::Delete)?;

    let result = sqlx::query("DELETE FROM maintenance_jobs WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Job not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
