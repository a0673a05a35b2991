use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::MaintenanceTemplate;
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/maintenance/templates", get(list).post(create))
        .route("/api/maintenance/templates/:id", get(show).put(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct TemplatePayload {
    name: String,
    description: Option<String>,
    interval_days: i32,
    #[serde(default)]
    tasks: Vec<String>,
}

impl TemplatePayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::invalid_field("name", "must not be empty"));
        }
        if self.interval_days < 1 {
            return Err(ApiError::invalid_field("interval_days", "must be positive"));
        }
        Ok(())
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceTemplates, Action::List)?;

    let rows = sqlx::query_as::<_, MaintenanceTemplate>(
        "SELECT * FROM maintenance_templates ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": rows })))
}

async fn show(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceTemplates, Action::Read)?;

    let template = sqlx::query_as::<_, MaintenanceTemplate>(
        "SELECT * FROM maintenance_templates WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Template not found"))?;

    Ok(Json(json!({ "success": true, "data": template })))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<TemplatePayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::MaintenanceTemplates, Action::Create)?;
    payload.validate()?;

    let template = sqlx::query_as::<_, MaintenanceTemplate>(
        r#"
        INSERT INTO maintenance_templates (id, name, description, interval_days, tasks, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.interval_days)
    .bind(serde_json::json!(payload.tasks))
    .fetch_one(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": template }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TemplatePayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceTemplates, Action::Update)?;
    payload.validate()?;

    let template = sqlx::query_as::<_, MaintenanceTemplate>(
        r#"
        UPDATE maintenance_templates
        SET name = $2, description = $3, interval_days = $4, tasks = $5, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.interval_days)
    .bind(serde_json::json!(payload.tasks))
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Template not found"))?;

    Ok(Json(json!({ "success": true, "data": template })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::MaintenanceTemplates, Action::Delete)?;

    let result = sqlx::query("DELETE FROM maintenance_templates WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Template not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}
