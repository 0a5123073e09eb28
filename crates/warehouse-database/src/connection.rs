//! PostgreSQL connection pool.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio_util::sync::CancellationToken;
use tracing::info;

use warehouse_core::AppResult;
use warehouse_core::config::database::DatabaseConfig;

use crate::retry::RetryPolicy;

/// Shared handle to the connection pool.
///
/// Pool bounds come from [`DatabaseConfig`]; every store clones the inner
/// [`PgPool`], which is reference counted.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool, retrying while the server is still coming up.
    pub async fn connect(
        config: &DatabaseConfig,
        retry: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> AppResult<Self> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        let pool = retry
            .run("database.connect", cancel, || {
                options.clone().connect(&config.url)
            })
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self, cancel: &CancellationToken) -> AppResult<()> {
        RetryPolicy::none()
            .run("database.health_check", cancel, || {
                sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool)
            })
            .await
            .map(|_| ())
    }

    /// Close every connection. Pending acquires fail afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Hide the password of a connection URL for logging.
fn mask_password(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url[scheme_end..at].find(':') {
        Some(colon) => {
            let colon = scheme_end + colon;
            format!("{}:****{}", &url[..colon], &url[at..])
        }
        None => url.to_string(),
    }
}
