//! sqlx-backed store implementations.

mod bind;

pub mod audit;
pub mod item;
pub mod user;

pub use audit::PgAuditStore;
pub use item::PgItemStore;
pub use user::PgUserStore;
