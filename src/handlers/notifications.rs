use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::Notification;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list))
        .route("/api/notifications/:id/read", post(mark_read))
        .route("/api/notifications/:id", delete(remove))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    unread: Option<bool>,
}

/// GET /api/notifications - always scoped to the caller, whatever the role
async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Notifications, Action::List)?;

    let rows = sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1 AND ($2::bool IS NULL OR read = NOT $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(claims.sub)
    .bind(query.unread)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

/// POST /api/notifications/:id/read
async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Notifications, Action::Update)?;

    let notification = sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET read = true WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(claims.sub)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    Ok(Json(json!({ "success": true, "data": notification })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Notifications, Action::Delete)?;

    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(claims.sub)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
