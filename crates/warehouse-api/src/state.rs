//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use warehouse_database::DatabasePool;
use warehouse_service::{AuditService, IdentityService, InventoryService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Item operations.
    pub inventory: Arc<InventoryService>,
    /// Audit trail queries and export.
    pub audit: Arc<AuditService>,
    /// Login and token verification.
    pub identity: Arc<IdentityService>,
    /// Connection pool, absent when running over in-memory stores.
    pub db: Option<DatabasePool>,
    /// Cancelled on shutdown. Each request works on a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates the state from its services.
    pub fn new(
        inventory: Arc<InventoryService>,
        audit: Arc<AuditService>,
        identity: Arc<IdentityService>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inventory,
            audit,
            identity,
            db: None,
            shutdown,
        }
    }

    /// Attaches the connection pool used by the health check.
    pub fn with_database(mut self, db: DatabasePool) -> Self {
        self.db = Some(db);
        self
    }

    /// Token for one request's store calls.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
