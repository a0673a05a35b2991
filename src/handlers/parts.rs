use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::{Part, PartMovement, PartStock};
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/parts", get(list).post(create))
        .route("/api/parts/stocks", get(stocks))
        .route("/api/parts/movements", get(list_movements).post(record_movement))
        .route("/api/parts/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct PartPayload {
    sku: String,
    name: String,
    unit_price: BigDecimal,
    min_stock: Option<i32>,
}

impl PartPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.sku.trim().is_empty() {
            return Err(ApiError::invalid_field("sku", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "must not be empty"));
        }
        if self.unit_price < BigDecimal::from(0) {
            return Err(ApiError::invalid_field("unit_price", "must not be negative"));
        }
        if matches!(self.min_stock, Some(m) if m < 0) {
            return Err(ApiError::invalid_field("min_stock", "must not be negative"));
        }
        Ok(())
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Parts, Action::List)?;

    let rows = sqlx::query_as::<_, Part>("SELECT * FROM parts ORDER BY sku")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Parts, Action::Read)?;

    let part = sqlx::query_as::<_, Part>("SELECT * FROM parts WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Part not found"))?;

    Ok(Json(json!({ "success": true, "data": part })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PartPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Parts, Action::Create)?;
    payload.validate()?;

    let inserted = sqlx::query_as::<_, Part>(
        r#"
        INSERT INTO parts (id, sku, name, unit_price, min_stock, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.sku.trim())
    .bind(payload.name.trim())
    .bind(&payload.unit_price)
    .bind(payload.min_stock.unwrap_or(0))
    .fetch_one(&state.pool)
    .await;

    let part = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::conflict("A part with this SKU already exists"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": part }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Parts, Action::Update)?;
    payload.validate()?;

    let part = sqlx::query_as::<_, Part>(
        r#"
        UPDATE parts
        SET sku = $2, name = $3, unit_price = $4, min_stock = COALESCE($5, min_stock), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.sku.trim())
    .bind(payload.name.trim())
    .bind(&payload.unit_price)
    .bind(payload.min_stock)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Part not found"))?;

    Ok(Json(json!({ "success": true, "data": part })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Parts, Action::Delete)?;

    let result = sqlx::query("DELETE FROM parts WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Part not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

/// GET /api/parts/stocks - stock on hand is the sum of movement deltas
async fn stocks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::PartStocks, Action::List)?;

    let rows = sqlx::query_as::<_, PartStock>(
        r#"
        SELECT p.id AS part_id, p.sku, p.name,
               COALESCE(SUM(m.delta), 0)::bigint AS on_hand,
               p.min_stock
        FROM parts p
        LEFT JOIN part_movements m ON m.part_id = p.id
        GROUP BY p.id, p.sku, p.name, p.min_stock
        ORDER BY p.sku
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn list_movements(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::PartMovements, Action::List)?;

    let rows = sqlx::query_as::<_, PartMovement>(
        "SELECT * FROM part_movements ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

#[derive(Debug, Deserialize)]
struct MovementPayload {
    part_id: Uuid,
    delta: i32,
    reason: String,
    job_id: Option<Uuid>,
}

/// POST /api/parts/movements - record a signed stock delta
async fn record_movement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MovementPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::PartMovements, Action::Create)?;

    if payload.delta == 0 {
        return Err(ApiError::invalid_field("delta", "must not be zero"));
    }
    if payload.reason.trim().is_empty() {
        return Err(ApiError::invalid_field("reason", "must not be empty"));
    }

    let inserted = sqlx::query_as::<_, PartMovement>(
        r#"
        INSERT INTO part_movements (id, part_id, delta, reason, job_id, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.part_id)
    .bind(payload.delta)
    .bind(payload.reason.trim())
    .bind(payload.job_id)
    .bind(claims.sub)
    .fetch_one(&state.pool)
    .await;

    let movement = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown part or job reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": movement }))))
}
