use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

mod login;
mod register;
mod session;

/// Token acquisition endpoints, reachable without a bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register::register))
        .route("/auth/login", post(login::login))
}

/// Session endpoints for already-authenticated callers.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(session::me))
        .route("/auth/change-password", post(session::change_password))
}

pub(crate) use register::validate_password;
