//! User domain entities.

pub mod claims;
pub mod model;
pub mod role;

pub use claims::AuthClaims;
pub use model::{CreateUser, User};
pub use role::UserRole;
