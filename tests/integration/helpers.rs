//! Shared helpers for the PostgreSQL store tests.

use std::str::FromStr;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use warehouse_core::config::database::DatabaseConfig;
use warehouse_database::{
    DatabasePool, PgAuditStore, PgItemStore, PgUserStore, RetryPolicy, UserStore,
};
use warehouse_entity::item::CreateItem;
use warehouse_entity::user::{CreateUser, User, UserRole};

/// Stores wired against a live database named by `DATABASE_URL`.
pub struct TestDb {
    /// Connection pool
    pub db: DatabasePool,
    /// Item store
    pub items: PgItemStore,
    /// Audit store
    pub audit: PgAuditStore,
    /// User store
    pub users: PgUserStore,
    /// Token passed to every store call
    pub cancel: CancellationToken,
    /// A freshly created user that performs the mutations
    pub actor: User,
}

impl TestDb {
    /// Connect, migrate, and create an acting user.
    pub async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let config = DatabaseConfig {
            url,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 60,
        };
        let cancel = CancellationToken::new();

        let db = DatabasePool::connect(&config, &RetryPolicy::none(), &cancel)
            .await
            .expect("Failed to connect to test database");
        warehouse_database::migration::run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let items = PgItemStore::new(db.pool().clone(), RetryPolicy::none());
        let audit = PgAuditStore::new(db.pool().clone(), RetryPolicy::none());
        let users = PgUserStore::new(db.pool().clone(), RetryPolicy::none());

        let actor = users
            .create(
                &cancel,
                &CreateUser {
                    username: unique("actor"),
                    password_hash: "not-a-real-hash".to_string(),
                    role: UserRole::Manager,
                },
            )
            .await
            .expect("Failed to create actor");

        Self {
            db,
            items,
            audit,
            users,
            cancel,
            actor,
        }
    }
}

/// A name no other test run will use.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

/// A valid item with a unique SKU.
pub fn new_item(name: &str) -> CreateItem {
    CreateItem {
        name: name.to_string(),
        sku: unique("SKU"),
        quantity: 5,
        price: Decimal::from_str("19.99").unwrap(),
        location: Some("A-1".to_string()),
    }
}
