use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::database::models::User;
use crate::error::ApiError;
use crate::policy::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to customer; admin cannot be self-assigned here.
    pub role: Option<String>,
    pub customer_id: Option<Uuid>,
}

/// POST /auth/register - create an identity and return a token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "must not be empty"));
    }

    let role: Role = payload.role.as_deref().unwrap_or("customer").parse()?;
    if role == Role::Admin {
        return Err(ApiError::invalid_field("role", "admin accounts cannot be self-registered"));
    }

    let password_hash = password::hash(&payload.password)?;

    let inserted = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, customer_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now(), now())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.email.trim().to_lowercase())
    .bind(&password_hash)
    .bind(payload.name.trim())
    .bind(role.as_str())
    .bind(payload.customer_id)
    .fetch_one(&state.pool)
    .await;

    let user = match inserted {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::conflict("An account with this email already exists"));
        }
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            return Err(ApiError::invalid_field("customer_id", "unknown customer"));
        }
        Err(other) => return Err(other.into()),
    };

    let token = state
        .tokens
        .issue(user.id, &user.email, &user.name, role, user.customer_id)?;

    tracing::info!("registered user {} with role {}", user.email, role);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "user": user, "token": token } })),
    ))
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::invalid_field("email", "must not be empty"));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err(ApiError::invalid_field("email", "invalid email format"));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::invalid_field("password", "must be at least 8 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn password_validation() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
    }
}
