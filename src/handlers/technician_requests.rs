use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::{RequestStatus, TechnicianRequest};
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, Role};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/technician-requests", get(list).post(submit))
        .route("/api/technician-requests/:id/approve", post(approve))
        .route("/api/technician-requests/:id/reject", post(reject))
}

#[derive(Debug, Deserialize)]
struct SubmitPayload {
    message: Option<String>,
}

/// POST /api/technician-requests - apply for technician capability.
/// The pending-uniqueness invariant is enforced by a conditional insert,
/// so two concurrent submissions cannot both land.
async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::TechnicianRequests, Action::Create)?;

    let request = sqlx::query_as::<_, TechnicianRequest>(
        r#"
        INSERT INTO technician_requests (id, user_id, status, message, created_at)
        SELECT $1, $2, 'pending', $3, now()
        WHERE NOT EXISTS (
            SELECT 1 FROM technician_requests WHERE user_id = $2 AND status = 'pending'
        )
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(claims.sub)
    .bind(&payload.message)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::conflict("A pending request already exists for this user"))?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": request }))))
}

/// GET /api/technician-requests - back office sees all, everyone else
/// sees their own submissions.
async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::TechnicianRequests, Action::List)?;

    let self_param = match claims.role {
        Role::Admin | Role::Manager => None,
        _ => Some(claims.sub),
    };

    let rows = sqlx::query_as::<_, TechnicianRequest>(
        r#"
        SELECT * FROM technician_requests
        WHERE ($1::uuid IS NULL OR user_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(self_param)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

/// POST /api/technician-requests/:id/approve
///
/// Approval is idempotent with respect to the technician record: the
/// conditional insert creates one only if none exists for the identity,
/// and the row lock on the request serializes concurrent resolutions.
async fn approve(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::TechnicianRequests, Action::Update)?;

    let mut tx = state.pool.begin().await?;

    let request = sqlx::query_as::<_, TechnicianRequest>(
        "SELECT * FROM technician_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let current: RequestStatus = request.status.parse()?;
    if !current.can_transition_to(RequestStatus::Approved) {
        return Err(ApiError::conflict(format!("Request is already {}", current)));
    }

    let request = sqlx::query_as::<_, TechnicianRequest>(
        r#"
        UPDATE technician_requests
        SET status = 'approved', resolved_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO technicians (id, user_id, active, created_at)
        SELECT $1, $2, true, now()
        WHERE NOT EXISTS (SELECT 1 FROM technicians WHERE user_id = $2)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.user_id)
    .execute(&mut *tx)
    .await?;

    // the sole promotion pathway out of an unprivileged role
    sqlx::query("UPDATE users SET role = 'technician', updated_at = now() WHERE id = $1")
        .bind(request.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("technician request {} approved for user {}", id, request.user_id);

    Ok(Json(json!({ "success": true, "data": request })))
}

/// POST /api/technician-requests/:id/reject - status update only, never
/// creates a technician record.
async fn reject(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::TechnicianRequests, Action::Update)?;

    let mut tx = state.pool.begin().await?;

    let request = sqlx::query_as::<_, TechnicianRequest>(
        "SELECT * FROM technician_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let current: RequestStatus = request.status.parse()?;
    if !current.can_transition_to(RequestStatus::Rejected) {
        return Err(ApiError::conflict(format!("Request is already {}", current)));
    }

    let request = sqlx::query_as::<_, TechnicianRequest>(
        r#"
        UPDATE technician_requests
        SET status = 'rejected', resolved_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(json!({ "success": true, "data": request })))
}
