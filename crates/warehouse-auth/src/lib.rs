//! # warehouse-auth
//!
//! Identity verification and authorization for Warehouse Control.
//!
//! ## Modules
//!
//! - `jwt`: signed, time-bounded tokens carrying user id, username and role
//! - `password`: Argon2id hashing and the credential verification capability
//! - `rbac`: the role → operation table consulted before every gated call

pub mod jwt;
pub mod password;
pub mod rbac;

pub use jwt::{ClaimsCodec, TokenClaims};
pub use password::{CredentialVerifier, PasswordHasher};
pub use rbac::{AccessPolicy, Operation};
