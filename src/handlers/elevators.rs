use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Claims;
use crate::database::models::{Elevator, ElevatorState};
use crate::error::ApiError;
use crate::policy::{authorize, Action, Resource, TenantScope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/elevators", get(list).post(create))
        .route("/api/elevators/:id", get(show).put(update).delete(remove))
        .route("/api/elevators/:id/state", patch(change_state))
}

/// Outcome of a state write that warrants a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultEvent {
    Raised,
    Cleared,
}

/// Only the transitions into and out of fault notify; everything else,
/// including same-state writes, is silent.
fn fault_event(old: ElevatorState, new: ElevatorState) -> Option<FaultEvent> {
    match (old, new) {
        (ElevatorState::Normal, ElevatorState::Fault) => Some(FaultEvent::Raised),
        (ElevatorState::Fault, ElevatorState::Normal) => Some(FaultEvent::Cleared),
        _ => None,
    }
}

fn notification_tag(elevator_id: Uuid) -> String {
    format!("elevator:{}", elevator_id)
}

#[derive(Debug, Deserialize)]
struct ElevatorPayload {
    building_id: Uuid,
    serial_number: String,
    brand: Option<String>,
    model: Option<String>,
    floors: Option<i32>,
    capacity_kg: Option<i32>,
    installed_on: Option<NaiveDate>,
}

impl ElevatorPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.serial_number.trim().is_empty() {
            return Err(ApiError::invalid_field("serial_number", "must not be empty"));
        }
        if matches!(self.capacity_kg, Some(kg) if kg <= 0) {
            return Err(ApiError::invalid_field("capacity_kg", "must be positive"));
        }
        Ok(())
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Elevators, Action::List)?;
    let scope = TenantScope::customer_owned(&claims);

    // ownership chain runs through the building
    let rows = sqlx::query_as::<_, Elevator>(
        r#"
        SELECT e.* FROM elevators e
        JOIN buildings b ON b.id = e.building_id
        WHERE ($1::uuid IS NULL OR b.customer_id = $1)
        ORDER BY e.serial_number
        "#,
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
    authorize(claims.role, Resource::Elevators, Action::Read)?;
    let scope = TenantScope::customer_owned(&claims);

    let elevator = fetch_scoped(&state, id, scope.customer_param()).await?;
    Ok(Json(json!({ "success": true, "data": elevator })))
}

async fn fetch_scoped(
    state: &AppState,
    id: Uuid,
    customer_param: Option<Uuid>,
) -> Result<Elevator, ApiError> {
    sqlx::query_as::<_, Elevator>(
        r#"
        SELECT e.* FROM elevators e
        JOIN buildings b ON b.id = e.building_id
        WHERE e.id = $1 AND ($2::uuid IS NULL OR b.customer_id = $2)
        "#,
    )
    .bind(id)
    .bind(customer_param)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Elevator not found"))
}

async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ElevatorPayload>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authorize(claims.role, Resource::Elevators, Action::Create)?;
    payload.validate()?;

    let inserted = sqlx::query_as::<_, Elevator>(
        r#"
        INSERT INTO elevators (id, building_id, serial_number, brand, model, floors, capacity_kg, state, installed_on, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.building_id)
    .bind(payload.serial_number.trim())
    .bind(&payload.brand)
    .bind(&payload.model)
    .bind(payload.floors)
    .bind(payload.capacity_kg)
    .bind(ElevatorState::Normal.as_str())
    .bind(payload.installed_on)
    .fetch_one(&state.pool)
    .await;

    let elevator = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::invalid_field("building_id", "unknown building"));
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::conflict("An elevator with this serial number already exists"));
        }
        Err(other) => return Err(other.into()),
    };

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": elevator }))))
}

async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ElevatorPayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Elevators, Action::Update)?;
    payload.validate()?;
    let scope = TenantScope::customer_owned(&claims);

    // state is written only through the dedicated state endpoint
    let elevator = sqlx::query_as::<_, Elevator>(
        r#"
        UPDATE elevators e
        SET building_id = $2, serial_number = $3, brand = $4, model = $5,
            floors = $6, capacity_kg = $7, installed_on = $8, updated_at = now()
        FROM buildings b
        WHERE e.id = $1 AND b.id = e.building_id
          AND ($9::uuid IS NULL OR b.customer_id = $9)
        RETURNING e.*
        "#,
    )
    .bind(id)
    .bind(payload.building_id)
    .bind(payload.serial_number.trim())
    .bind(&payload.brand)
    .bind(&payload.model)
    .bind(payload.floors)
    .bind(payload.capacity_kg)
    .bind(payload.installed_on)
    .bind(scope.customer_param())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Elevator not found"))?;

    Ok(Json(json!({ "success": true, "data": elevator })))
}

#[derive(Debug, Deserialize)]
struct StateChangePayload {
    state: String,
}

/// PATCH /api/elevators/:id/state - write the state, notifying the acting
/// user on fault transitions. Prior notifications with the same elevator
/// tag are superseded so a flapping elevator never piles up duplicates.
async fn change_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StateChangePayload>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Elevators, Action::Update)?;
    let new_state: ElevatorState = payload.state.parse()?;
    let scope = TenantScope::customer_owned(&claims);

    let current = fetch_scoped(&state, id, scope.customer_param()).await?;
    let old_state: ElevatorState = current.state.parse()?;

    let mut tx = state.pool.begin().await?;

    let elevator = sqlx::query_as::<_, Elevator>(
        "UPDATE elevators SET state = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(new_state.as_str())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(event) = fault_event(old_state, new_state) {
        let tag = notification_tag(id);
        let message = match event {
            FaultEvent::Raised => format!("Elevator {} reported a fault", elevator.serial_number),
            FaultEvent::Cleared => format!("Elevator {} is back to normal", elevator.serial_number),
        };

        sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND tag = $2")
            .bind(claims.sub)
            .bind(&tag)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, tag, message, read, created_at)
            VALUES ($1, $2, $3, $4, false, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(claims.sub)
        .bind(&tag)
        .bind(&message)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "success": true, "data": elevator })))
}

async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(claims.role, Resource::Elevators, Action::Delete)?;
    let scope = TenantScope::customer_owned(&claims);

    let result = sqlx::query(
        r#"
        DELETE FROM elevators e
        USING buildings b
        WHERE e.id = $1 AND b.id = e.building_id
          AND ($2::uuid IS NULL OR b.customer_id = $2)
        "#,
    )
    .bind(id)
    .bind(scope.customer_param())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Elevator not found"));
    }

    Ok(Json(json!({ "success": true, "data": { "deleted": id } })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fault_transitions_notify() {
        use ElevatorState::*;

        assert_eq!(fault_event(Normal, Fault), Some(FaultEvent::Raised));
        assert_eq!(fault_event(Fault, Normal), Some(FaultEvent::Cleared));

        // same-state writes are silent
        assert_eq!(fault_event(Fault, Fault), None);
        assert_eq!(fault_event(Normal, Normal), None);

        // unrelated transitions are silent
        assert_eq!(fault_event(Normal, InMaintenance), None);
        assert_eq!(fault_event(InMaintenance, Normal), None);
        assert_eq!(fault_event(Fault, WaitingQuotation), None);
        assert_eq!(fault_event(WaitingMaintenance, Fault), None);
    }

    #[test]
    fn tag_is_stable_per_elevator() {
        let id = Uuid::new_v4();
        assert_eq!(notification_tag(id), notification_tag(id));
        assert!(notification_tag(id).starts_with("elevator:"));
    }
}
