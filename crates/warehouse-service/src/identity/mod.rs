//! Login, token verification and user provisioning.

pub mod service;

pub use service::{IdentityService, LoginResult};
