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
use crate::database::models::Invoice;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list).post(create))
        .route("/api/invoices/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct InvoicePayload {
    customer_id: Uuid,
    contract_id: Option<Uuid>,
    amount: BigDecimal,
    issued_on: NaiveDate,
    due_on: NaiveDate,
    status: Option<String>,
}

const INVOICE_STATUSES: &[&str] = &["open", "paid", "cancelled"];

impl InvoicePayload {
    fn validate(&self) -> Result<&str, ApiError> {
        if self.amount < BigDecimal::from(0) {
            return Err(ApiError::invalid_field("amount", "must not be negative"));
        }
        if self.due_on < self.issued_on {
            return Err(ApiError::invalid_field("due_on", "must not precede issued_on"));
        }
        let status = self.status.as_deref().unwrap_or("open");
        if !INVOICE_STATUSES.contains(&status) {
            return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
        }
        Ok(status)
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Invoices, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    let rows = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY issued_on DESC",
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
    authorize(claims.role, Resource::Invoices, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let invoice = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    Ok(Json(json!({ "success": true, "data": invoice })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<InvoicePayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Invoices, Action::Create)?;
    let status = payload.validate()?.to_string();

    let inserted = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (id, customer_id, contract_id, amount, issued_on, due_on, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.customer_id)
    .bind(payload.contract_id)
    .bind(&payload.amount)
    .bind(payload.issued_on)
    .bind(payload.due_on)
    .bind(&status)
    .fetch_one(&state.pool)
    .await;

    let invoice = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown customer or contract reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": invoice }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoicePayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Invoices, Action::Update)?;
    let status = payload.validate()?.to_string();
    let scope = TenantScope::customer_owned(&claims);

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE invoices
        SET customer_id = $2, contract_id = $3, amount = $4, issued_on = $5, due_on = $6, status = $7, updated_at = now()
        WHERE id = $1 AND ($8::uuid IS NULL OR customer_id = $8)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.customer_id)
    .bind(payload.contract_id)
    .bind(&payload.amount)
    .bind(payload.issued_on)
    .bind(payload.due_on)
    .bind(&status)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Invoice not found"))?;

    Ok(Json(json!({ "success": true, "data": invoice })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Invoices, Action::Delete)?;

    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Invoice not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_must_not_precede_issue_date() {
        let payload = InvoicePayload {
            customer_id: Uuid::new_v4(),
            contract_id: None,
            amount: BigDecimal::from(100),
            issued_on: "2026-02-01".parse().unwrap(),
            due_on: "2026-01-01".parse().unwrap(),
            status: None,
        };
        assert!(payload.validate().is_err());
    }
}
