use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Quotation;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, Role, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quotations", get(list).post(create))
        .route("/api/quotations/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct CreateQuotationPayload {
    /// Ignored for customer callers, who always quote for themselves.
    customer_id: Option<Uuid>,
    elevator_id: Option<Uuid>,
    description: String,
    amount: Option<BigDecimal>,
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Quotations, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    let rows = sqlx::query_as::<_, Quotation>(
        "SELECT * FROM quotations WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY created_at DESC",
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
    authorize(claims.role, Resource::Quotations, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let quotation = sqlx::query_as::<_, Quotation>(
        "SELECT * FROM quotations WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Quotation not found"))?;

    Ok(Json(json!({ "success": true, "data": quotation })))
}

/// POST /api/quotations - customers request a quote for their own tenant;
/// the back office may create one for any customer.
async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuotationPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Quotations, Action::Create)?;

    if payload.description.trim().is_empty() {
        return Err(ApiError::invalid_field("description", "must not be empty"));
    }

    let customer_id = match claims.role {
        Role::Customer => claims
            .customer_id
            .ok_or_else(|| ApiError::forbidden("Account is not linked to a customer"))?,
        _ => payload
            .customer_id
            .ok_or_else(|| ApiError::invalid_field("customer_id", "is required"))?,
    };

    let amount = payload.amount.unwrap_or_else(|| BigDecimal::from(0));
    if amount < BigDecimal::from(0) {
        return Err(ApiError::invalid_field("amount", "must not be negative"));
    }

    let inserted = sqlx::query_as::<_, Quotation>(
        r#"
        INSERT INTO quotations (id, customer_id, elevator_id, description, amount, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'pending', now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(payload.elevator_id)
    .bind(payload.description.trim())
    .bind(&amount)
    .fetch_one(&state.pool)
    .await;

    let quotation = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown customer or elevator reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": quotation }))))
}

#[derive(Debug, Deserialize)]
struct UpdateQuotationPayload {
    description: Option<String>,
    amount: Option<BigDecimal>,
    status: Option<String>,
}

const QUOTATION_STATUSES: &[&str] = &["pending", "approved", "rejected"];

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuotationPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Quotations, Action::Update)?;

    if let Some(status) = payload.status.as_deref() {
        if !QUOTATION_STATUSES.contains(&status) {
            return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
        }
    }
    if matches!(&payload.amount, Some(a) if *a < BigDecimal::from(0)) {
        return Err(ApiError::invalid_field("amount", "must not be negative"));
    }

    let quotation = sqlx::query_as::<_, Quotation>(
        r#"
        UPDATE quotations
        SET description = COALESCE($2, description),
            amount = COALESCE($3, amount),
            status = COALESCE($4, status),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.description.as_deref().map(str::trim))
    .bind(&payload.amount)
    .bind(&payload.status)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Quotation not found"))?;

    Ok(Json(json!({ "success": true, "data": quotation })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Quotations, Action::Delete)?;

    let result = sqlx::query("DELETE FROM quotations WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Quotation not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
