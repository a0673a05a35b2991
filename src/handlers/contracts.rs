use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Contract;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/contracts", get(list).post(create))
        .route("/api/contracts/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct ContractPayload {
    customer_id: Uuid,
    starts_on: NaiveDate,
    ends_on: NaiveDate,
    monthly_fee: BigDecimal,
    status: Option<String>,
}

const CONTRACT_STATUSES: &[&str] = &["active", "expired", "cancelled"];

impl ContractPayload {
    fn validate(&self) -> Result<&str, ApiError> {
        if self.ends_on <= self.starts_on {
            return Err(ApiError::invalid_field("ends_on", "must be after starts_on"));
        }
        if self.monthly_fee < BigDecimal::from(0) {
            return Err(ApiError::invalid_field("monthly_fee", "must not be negative"));
        }
        let status = self.status.as_deref().unwrap_or("active");
        if !CONTRACT_STATUSES.contains(&status) {
            return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
        }
        Ok(status)
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Contracts, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    let rows = sqlx::query_as::<_, Contract>(
        "SELECT * FROM contracts WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY starts_on DESC",
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
    authorize(claims.role, Resource::Contracts, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let contract = sqlx::query_as::<_, Contract>(
        "SELECT * FROM contracts WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Contract not found"))?;

    Ok(Json(json!({ "success": true, "data": contract })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ContractPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Contracts, Action::Create)?;
    let status = payload.validate()?.to_string();

    let inserted = sqlx::query_as::<_, Contract>(
        r#"
        INSERT INTO contracts (id, customer_id, starts_on, ends_on, monthly_fee, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.customer_id)
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .bind(&payload.monthly_fee)
    .bind(&status)
    .fetch_one(&state.pool)
    .await;

    let contract = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::invalid_field("customer_id", "unknown customer"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": contract }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContractPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Contracts, Action::Update)?;
    let status = payload.validate()?.to_string();
    let scope = TenantScope::customer_owned(&claims);

    let contract = sqlx::query_as::<_, Contract>(
        r#"
        UPDATE contracts
        SET customer_id = $2, starts_on = $3, ends_on = $4, monthly_fee = $5, status = $6, updated_at = now()
        WHERE id = $1 AND ($7::uuid IS NULL OR customer_id = $7)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.customer_id)
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .bind(&payload.monthly_fee)
    .bind(&status)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Contract not found"))?;

    Ok(Json(json!({ "success": true, "data": contract })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Contracts, Action::Delete)?;
    let scope = TenantScope::customer_owned(&claims);

    let result = sqlx::query(
        "DELETE FROM contracts WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Contract not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(starts: &str, ends: &str, fee: i64) -> ContractPayload {
        ContractPayload {
            customer_id: Uuid::new_v4(),
            starts_on: starts.parse().unwrap(),
            ends_on: ends.parse().unwrap(),
            monthly_fee: BigDecimal::from(fee),
            status: None,
        }
    }

    #[test]
    fn date_order_is_enforced() {
        assert!(payload("2026-01-01", "2027-01-01", 100).validate().is_ok());
        assert!(payload("2027-01-01", "2026-01-01", 100).validate().is_err());
        assert!(payload("2026-01-01", "2026-01-01", 100).validate().is_err());
    }

    #[test]
    fn negative_fee_is_rejected() {
        assert!(payload("2026-01-01", "2027-01-01", -5).validate().is_err());
    }

    #[test]
    fn status_defaults_to_active() {
        assert_eq!(payload("2026-01-01", "2027-01-01", 100).validate().unwrap(), "active");
    }
}
