use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::config::AppConfig;

/// Shared application state handed to every handler. Cloning is cheap:
/// the pool and token keys are internally reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub tokens: TokenService,
}

impl AppState {
    /// Wire up state from configuration. Fails fast on a misconfigured
    /// signing secret or an unparseable database URL; actual database
    /// connections are established lazily on first use.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        )?;
        let pool = crate::database::connect_pool(&config.database)?;

        Ok(Self {
            config: Arc::new(config),
            pool,
            tokens,
        })
    }
}
