use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use liftops_api::config::AppConfig;
use liftops_api::handlers;
use liftops_api::middleware::authenticate;
use liftops_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the signing secret
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting LiftOps API in {:?} mode", config.environment);

    let state = AppState::from_config(config)?;
    let port = state.config.server.port;
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("LiftOps API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    // Everything under /api plus the session endpoints requires a verified
    // bearer token; role checks happen per handler against the capability
    // table.
    let protected = Router::new()
        .merge(handlers::auth::protected_routes())
        .merge(handlers::customers::routes())
        .merge(handlers::buildings::routes())
        .merge(handlers::elevators::routes())
        .merge(handlers::technicians::routes())
        .merge(handlers::technician_requests::routes())
        .merge(handlers::contracts::routes())
        .merge(handlers::quotations::routes())
        .merge(handlers::invoices::routes())
        .merge(handlers::pricing::routes())
        .merge(handlers::maintenance::routes())
        .merge(handlers::tickets::routes())
        .merge(handlers::parts::routes())
        .merge(handlers::notifications::routes())
        .merge(handlers::alerts::routes())
        .merge(handlers::dashboard::routes())
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(handlers::auth::public_routes())
        .merge(protected)
        // Global middleware
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "LiftOps API",
            "version": version,
            "description": "Administration backend for an elevator maintenance business",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public); /auth/me, /auth/change-password (protected)",
                "resources": "/api/customers, /api/buildings, /api/elevators, /api/technicians, /api/technician-requests, /api/contracts, /api/quotations, /api/invoices, /api/pricing-settings, /api/maintenance/*, /api/tickets, /api/parts, /api/notifications, /api/alerts, /api/dashboard/summary (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match liftops_api::database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
