use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Building;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/buildings", get(list).post(create))
        .route("/api/buildings/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct BuildingPayload {
    customer_id: Uuid,
    name: String,
    address: String,
    floors: Option<i32>,
}

impl BuildingPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "must not be empty"));
        }
        if self.address.trim().is_empty() {
            return Err(ApiError::invalid_field("address", "must not be empty"));
        }
        if matches!(self.floors, Some(f) if f < 1) {
            return Err(ApiError::invalid_field("floors", "must be positive"));
        }
        Ok(())
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Buildings, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    let rows = sqlx::query_as::<_, Building>(
        "SELECT * FROM buildings WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY name",
    )
    .bind(scope.customer_param())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Buildings, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let building = sqlx::query_as::<_, Building>(
        "SELECT * FROM buildings WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Building not found"))?;

    Ok(Json(json!({ "success": true, "data": building })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BuildingPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Buildings, Action::Create)?;
    payload.validate()?;

    let inserted = sqlx::query_as::<_, Building>(
        r#"
        INSERT INTO buildings (id, customer_id, name, address, floors, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.customer_id)
    .bind(payload.name.trim())
    .bind(payload.address.trim())
    .bind(payload.floors)
    .fetch_one(&state.pool)
    .await;

    let building = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::invalid_field("customer_id", "unknown customer"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": building }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BuildingPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Buildings, Action::Update)?;
    payload.validate()?;
    let scope = TenantScope::customer_owned(&claims);

    // scope bound on the write path too, same as reads
    let building = sqlx::query_as::<_, Building>(
        r#"
        UPDATE buildings
        SET customer_id = $2, name = $3, address = $4, floors = $5, updated_at = now()
        WHERE id = $1 AND ($6::uuid IS NULL OR customer_id = $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.customer_id)
    .bind(payload.name.trim())
    .bind(payload.address.trim())
    .bind(payload.floors)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Building not found"))?;

    Ok(Json(json!({ "success": true, "data": building })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Buildings, Action::Delete)?;
    let scope = TenantScope::customer_owned(&claims);

    let result = sqlx::query(
        "DELETE FROM buildings WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Building not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
