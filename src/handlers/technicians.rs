use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Technician;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, Role};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/technicians", get(list).post(create))
        .route("/api/technicians/:id", get(show).put(update).delete(remove))
}

/// Resolve the technician record backing a user, if any. Job scoping for
/// technician-role callers hangs off this id.
pub async fn technician_id_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Uuid>, ApiError> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM technicians WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Technicians, Action::List)?;

    let rows = sqlx::query_as::<_, Technician>("SELECT * FROM technicians ORDER BY created_at")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Technicians, Action::Read)?;

    // technicians may only read their own record
    let self_param = match claims.role {
        Role::Technician => Some(claims.sub),
        _ => None,
    };

    let technician = sqlx::query_as::<_, Technician>(
        "SELECT * FROM technicians WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)",
    )
    .bind(id)
    .bind(self_param)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Technician not found"))?;

    Ok(Json(json!({ "success": true, "data": technician })))
}

#[derive(Debug, Deserialize)]
struct CreateTechnicianPayload {
    user_id: Uuid,
    specialty: Option<String>,
    phone: Option<String>,
}

/// Direct creation by the back office. The request-approval workflow is
/// the other, self-service path to the same record.
async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTechnicianPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Technicians, Action::Create)?;

    let mut tx = state.pool.begin().await?;

    let inserted = sqlx::query_as::<_, Technician>(
        r#"
        INSERT INTO technicians (id, user_id, specialty, phone, active, created_at)
        VALUES ($1, $2, $3, $4, true, now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.user_id)
    .bind(&payload.specialty)
    .bind(&payload.phone)
    .fetch_one(&mut *tx)
    .await;

    let technician = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::conflict("A technician record already exists for this user"));
        }
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::invalid_field("user_id", "unknown user"));
        }
        Err(other) => return Err(other.into()),
    };

    sqlx::query("UPDATE users SET role = 'technician', updated_at = now() WHERE id = $1")
        .bind(payload.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": technician }))))
}

#[derive(Debug, Deserialize)]
struct UpdateTechnicianPayload {
    specialty: Option<String>,
    phone: Option<String>,
    active: Option<bool>,
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTechnicianPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Technicians, Action::Update)?;

    let technician = sqlx::query_as::<_, Technician>(
        r#"
        UPDATE technicians
        SET specialty = COALESCE($2, specialty),
            phone = COALESCE($3, phone),
            active = COALESCE($4, active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&payload.specialty)
    .bind(&payload.phone)
    .bind(payload.active)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Technician not found"))?;

    Ok(Json(json!({ "success": true, "data": technician })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Technicians, Action::Delete)?;

    let result = sqlx::query("DELETE FROM technicians WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Technician not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
