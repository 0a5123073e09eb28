//! Warehouse Control server
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use warehouse_api::{AppState, build_app, serve};
use warehouse_auth::{AccessPolicy, ClaimsCodec, PasswordHasher};
use warehouse_core::config::AppConfig;
use warehouse_core::error::AppError;
use warehouse_database::{DatabasePool, PgAuditStore, PgItemStore, PgUserStore, RetryPolicy};
use warehouse_service::{AuditService, IdentityService, InventoryService};

#[tokio::main]
async fn main() {
    let env = std::env::var("WAREHOUSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Warehouse Control v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let retry = RetryPolicy::from_config(&config.retry);

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database, &retry, &shutdown).await?;

    warehouse_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Stores ───────────────────────────────────────────
    let item_store = Arc::new(PgItemStore::new(db.pool().clone(), retry.clone()));
    let audit_store = Arc::new(PgAuditStore::new(db.pool().clone(), retry.clone()));
    let user_store = Arc::new(PgUserStore::new(db.pool().clone(), retry));

    // ── Step 3: Auth ─────────────────────────────────────────────
    let policy = Arc::new(AccessPolicy::new());
    let codec = Arc::new(ClaimsCodec::new(&config.auth));
    let hasher = Arc::new(PasswordHasher::new());

    // ── Step 4: Services ─────────────────────────────────────────
    let inventory = Arc::new(InventoryService::new(
        item_store,
        Arc::clone(&policy),
        config.pagination,
    ));
    let audit = Arc::new(AuditService::new(
        audit_store,
        Arc::clone(&policy),
        config.pagination,
        config.export,
    ));
    let identity = Arc::new(IdentityService::new(
        user_store,
        codec,
        hasher.clone(),
        hasher,
    ));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let state = AppState::new(inventory, audit, identity, shutdown.clone()).with_database(db.clone());
    let app = build_app(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Warehouse Control listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let outcome = serve(listener, app, shutdown_signal(), shutdown, grace)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    db.close().await;
    tracing::info!("Warehouse Control shut down");
    outcome
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
