use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password;
use crate::database::models::User;
use crate::error::ApiError;
use crate::policy::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - authenticate and receive a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim().to_lowercase())
        .fetch_optional(&state.pool)
        .await?;

    // Same response for unknown email and wrong password
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
    if !password::verify(&payload.password, &user.password_hash) {
        tracing::warn!("failed login attempt for {}", user.email);
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let role: Role = user.role.parse().map_err(|_| {
        tracing::error!("user {} has unparseable role '{}'", user.id, user.role);
        ApiError::internal_server_error("Account is misconfigured")
    })?;

    let token = state
        .tokens
        .issue(user.id, &user.email, &user.name, role, user.customer_id)?;

    Ok(Json(json!({ "success": true, "data": { "user": user, "token": token } })))
}
