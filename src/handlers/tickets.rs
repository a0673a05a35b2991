use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Ticket;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, Role, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", get(list).post(create))
        .route("/api/tickets/:id", get(show).put(update).delete(remove))
}

const TICKET_STATUSES: &[&str] = &["open", "in_progress", "closed"];
const TICKET_PRIORITIES: &[&str] = &["low", "normal", "high"];

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Tickets, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    let rows = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE ($1::uuid IS NULL OR customer_id = $1) ORDER BY created_at DESC",
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
    authorize(claims.role, Resource::Tickets, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let ticket = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE id = $1 AND ($2::uuid IS NULL OR customer_id = $2)",
    )
    .bind(id)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    Ok(Json(json!({ "success": true, "data": ticket })))
}

#[derive(Debug, Deserialize)]
struct CreateTicketPayload {
    /// Ignored for customer callers, who always file for themselves.
    customer_id: Option<Uuid>,
    elevator_id: Option<Uuid>,
    subject: String,
    description: String,
    priority: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTicketPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Tickets, Action::Create)?;

    if payload.subject.trim().is_empty() {
        return Err(ApiError::invalid_field("subject", "must not be empty"));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::invalid_field("description", "must not be empty"));
    }
    let priority = payload.priority.as_deref().unwrap_or("normal");
    if !TICKET_PRIORITIES.contains(&priority) {
        return Err(ApiError::invalid_field("priority", format!("unknown priority '{}'", priority)));
    }

    let customer_id = match claims.role {
        Role::Customer => claims
            .customer_id
            .ok_or_else(|| ApiError::forbidden("Account is not linked to a customer"))?,
        _ => payload
            .customer_id
            .ok_or_else(|| ApiError::invalid_field("customer_id", "is required"))?,
    };

    let inserted = sqlx::query_as::<_, Ticket>(
        r#"
        INSERT INTO tickets (id, customer_id, elevator_id, subject, description, priority, status, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 'open', $7, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(payload.elevator_id)
    .bind(payload.subject.trim())
    .bind(payload.description.trim())
    .bind(priority)
    .bind(claims.sub)
    .fetch_one(&state.pool)
    .await;

    let ticket = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::bad_request("Unknown customer or elevator reference"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": ticket }))))
}

#[derive(Debug, Deserialize)]
struct UpdateTicketPayload {
    subject: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    status: Option<String>,
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTicketPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Tickets, Action::Update)?;

    if let Some(status) = payload.status.as_deref() {
        if !TICKET_STATUSES.contains(&status) {
            return Err(ApiError::invalid_field("status", format!("unknown status '{}'", status)));
        }
    }
    if let Some(priority) = payload.priority.as_deref() {
        if !TICKET_PRIORITIES.contains(&priority) {
            return Err(ApiError::invalid_field("priority", format!("unknown priority '{}'", priority)));
        }
    }

    let scope = TenantScope::customer_owned(&claims);

    let ticket = sqlx::query_as::<_, Ticket>(
        r#"
        UPDATE tickets
        SET subject = COALESCE($2, subject),
            description = COALESCE($3, description),
            priority = COALESCE($4, priority),
            status = COALESCE($5, status),
            updated_at = now()
        WHERE id = $1 AND ($6::uuid IS NULL OR customer_id = $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.subject.as_deref().map(str::trim))
    .bind(payload.description.as_deref().map(str::trim))
    .bind(&payload.priority)
    .bind(&payload.status)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Ticket not found"))?;

    Ok(Json(json!({ "success": true, "data": ticket })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Tickets, Action::Delete)?;

    let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Ticket not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
