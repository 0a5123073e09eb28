//! Argon2id credential hashing and the login-side verifier.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use warehouse_core::{AppError, AppResult};

use super::policy::check_password;

/// Stand-in hash verified when no account matches, so a login for an
/// unknown username costs the same Argon2 work as a wrong password.
/// Same parameters as [`Argon2::default`]; no input matches it.
const ABSENT_ACCOUNT_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$\
    d2FyZWhvdXNlLWFic2VudA$\
    AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Checks a presented secret against the stored credential of an account.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok(true)` when `plaintext` matches `stored`.
    ///
    /// `stored` is `None` when the account does not exist; the result is
    /// then always `false`, after the same amount of work.
    fn verify(&self, stored: Option<&str>, plaintext: &str) -> AppResult<bool>;
}

/// Hashes new passwords and verifies login attempts with Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a hasher with the default Argon2id parameters.
    pub fn new() -> Self {
        Self
    }

    /// Enforces the password policy, then hashes with a random salt.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        check_password(password)?;
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Runs one verification. A hash that cannot be parsed is a mismatch.
    fn matches(&self, hash: &str, password: &str) -> AppResult<bool> {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is not in PHC format");
            return Ok(false);
        };

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

impl CredentialVerifier for PasswordHasher {
    fn verify(&self, stored: Option<&str>, plaintext: &str) -> AppResult<bool> {
        match stored {
            Some(hash) => self.matches(hash, plaintext),
            None => {
                self.matches(ABSENT_ACCOUNT_HASH, plaintext)?;
                Ok(false)
            }
        }
    }
}
