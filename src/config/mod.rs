use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Process configuration, built once in `main` and handed down through
/// application state. Nothing in here is read from the environment after
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

impl AppConfig {
    /// Build configuration from the environment. Signing secret and
    /// database URL are required; everything else has environment-tier
    /// defaults overridable per variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let jwt_secret = env::var("LIFTOPS_JWT_SECRET")
            .map_err(|_| ConfigError::Missing("LIFTOPS_JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("LIFTOPS_JWT_SECRET", "must not be empty".into()));
        }

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        url::Url::parse(&database_url)
            .map_err(|e| ConfigError::Invalid("DATABASE_URL", e.to_string()))?;

        Ok(Self::defaults_for(environment, jwt_secret, database_url).with_env_overrides())
    }

    fn defaults_for(environment: Environment, jwt_secret: String, database_url: String) -> Self {
        let (max_connections, cors_origins) = match environment {
            Environment::Development => (10, vec!["http://localhost:5173".to_string()]),
            Environment::Staging => (20, vec![]),
            Environment::Production => (50, vec![]),
        };

        Self {
            environment,
            server: ServerConfig {
                port: 3000,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                connect_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry_hours: 8,
            },
        }
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("LIFTOPS_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("LIFTOPS_CORS_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("LIFTOPS_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_eight_hour_expiry() {
        let config = AppConfig::defaults_for(
            Environment::Development,
            "secret".into(),
            "postgres://localhost/liftops".into(),
        );
        assert_eq!(config.security.jwt_expiry_hours, 8);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn production_defaults_are_tighter() {
        let config = AppConfig::defaults_for(
            Environment::Production,
            "secret".into(),
            "postgres://localhost/liftops".into(),
        );
        assert_eq!(config.database.max_connections, 50);
        assert!(config.server.cors_origins.is_empty());
    }
}
