//! # warehouse-database
//!
//! Storage layer for Warehouse Control: the PostgreSQL connection pool,
//! embedded migrations, the store capabilities consumed by the services,
//! and two implementations of them.
//!
//! - [`postgres`]: sqlx-backed stores. Every item mutation runs in one
//!   transaction together with its audit row.
//! - [`memory`]: an in-process store with the same semantics, used by
//!   service and HTTP tests.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod retry;
pub mod stores;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use postgres::{PgAuditStore, PgItemStore, PgUserStore};
pub use retry::RetryPolicy;
pub use stores::{AuditStore, ItemStore, UserStore};
