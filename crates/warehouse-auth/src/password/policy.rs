//! Rules a new password must satisfy before it is hashed.

use warehouse_core::{AppError, AppResult};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest accepted password, in bytes. Bounds the Argon2 input.
pub const MAX_PASSWORD_BYTES: usize = 256;

/// Rejects passwords that are too short, too long, or blank.
pub fn check_password(password: &str) -> AppResult<()> {
    if password.trim().is_empty() {
        return Err(AppError::validation("password must not be blank"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}
