//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. The loaded [`AppConfig`] is immutable and handed to the
//! components that need it at construction time.

pub mod app;
pub mod auth;
pub mod database;
pub mod export;
pub mod logging;
pub mod pagination;
pub mod retry;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::{AuthConfig, MAX_TOKEN_TTL_MINUTES};
use self::database::DatabaseConfig;
use self::export::ExportConfig;
use self::logging::LoggingConfig;
use self::pagination::PaginationConfig;
use self::retry::RetryConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay) and `WAREHOUSE__*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Token signing settings.
    pub auth: AuthConfig,
    /// List endpoint page-size bounds.
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Storage retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Audit export bounds.
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `WAREHOUSE`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", &format!("config/{env}"))
    }

    /// Load configuration from an explicit base file and overlay file.
    pub fn load_from(base: &str, overlay: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(overlay).required(false))
            .add_source(
                config::Environment::with_prefix("WAREHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject combinations that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.pagination.default_page_size < 1
            || self.pagination.default_page_size > self.pagination.max_page_size
        {
            return Err(AppError::configuration(
                "pagination.default_page_size must be between 1 and pagination.max_page_size",
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::configuration(
                "database.min_connections must not exceed database.max_connections",
            ));
        }
        if self.auth.token_ttl_minutes == 0 || self.auth.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            )));
        }
        if self.export.max_rows < 1 {
            return Err(AppError::configuration("export.max_rows must be at least 1"));
        }
        if self.retry.attempts == 0 {
            return Err(AppError::configuration("retry.attempts must be at least 1"));
        }
        Ok(())
    }
}
