//! Password policy, hashing and verification.

pub mod hasher;
pub mod policy;

pub use hasher::{CredentialVerifier, PasswordHasher};
pub use policy::{MIN_PASSWORD_LEN, check_password};
