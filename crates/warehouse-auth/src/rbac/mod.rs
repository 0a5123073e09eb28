//! Role-based access control.

pub mod enforcer;
pub mod policies;

pub use enforcer::AccessPolicy;
pub use policies::{Operation, PolicyTable};
