use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Customer;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct CustomerPayload {
    name: String,
    business_type: String,
    contact_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

impl CustomerPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "must not be empty"));
        }
        if self.business_type.trim().is_empty() {
            return Err(ApiError::invalid_field("business_type", "must not be empty"));
        }
        Ok(())
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Customers, Action::List)?;

    let rows = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Customers, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    // for customer callers the owning chain is the row itself
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND ($2::uuid IS NULL OR id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(json!({ "success": true, "data": customer })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CustomerPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Customers, Action::Create)?;
    payload.validate()?;

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, name, business_type, contact_name, email, phone, address, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(payload.business_type.trim())
    .bind(&payload.contact_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.address)
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": customer }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Customers, Action::Update)?;
    payload.validate()?;

    let customer = sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = $2, business_type = $3, contact_name = $4, email = $5, phone = $6, address = $7, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(payload.business_type.trim())
    .bind(&payload.contact_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.address)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Customer not found"))?;

    Ok(Json(json!({ "success": true, "data": customer })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Customers, Action::Delete)?;

    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Customer not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
