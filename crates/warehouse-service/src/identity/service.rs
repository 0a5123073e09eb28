//! Identity service: login, token verification and user provisioning.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use warehouse_auth::{ClaimsCodec, CredentialVerifier, PasswordHasher};
use warehouse_core::{AppError, AppResult, ErrorKind};
use warehouse_database::UserStore;
use warehouse_entity::user::{AuthClaims, CreateUser, User, UserRole};

use crate::context::RequestContext;

/// Maximum accepted username length.
pub const MAX_USERNAME_LEN: usize = 64;

/// A freshly issued token together with the user it identifies.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    /// Signed bearer token.
    pub token: String,
    /// The authenticated user. The password hash is never serialized.
    pub user: User,
}

/// Authenticates users and manages accounts.
#[derive(Clone)]
pub struct IdentityService {
    /// User persistence.
    users: Arc<dyn UserStore>,
    /// Token issuer and validator.
    codec: Arc<ClaimsCodec>,
    /// Compares presented passwords with stored hashes.
    verifier: Arc<dyn CredentialVerifier>,
    /// Hashes passwords of new users.
    hasher: Arc<PasswordHasher>,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    /// Creates a new identity service.
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: Arc<ClaimsCodec>,
        verifier: Arc<dyn CredentialVerifier>,
        hasher: Arc<PasswordHasher>,
    ) -> Self {
        Self {
            users,
            codec,
            verifier,
            hasher,
        }
    }

    /// Checks credentials and issues a token.
    ///
    /// An unknown username and a wrong password fail identically, and both
    /// pay for one password verification.
    pub async fn login(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
    ) -> AppResult<LoginResult> {
        let user = match self.users.find_by_username(cancel, username).await {
            Ok(user) => user,
            Err(e) if e.is(ErrorKind::NotFound) => {
                self.verifier.verify(None, password)?;
                warn!(username, "Login failed: unknown user");
                return Err(AppError::invalid_credentials());
            }
            Err(e) => return Err(e),
        };

        if !self.verifier.verify(Some(&user.password_hash), password)? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::invalid_credentials());
        }

        let token = self.codec.issue(&AuthClaims::from(&user))?;
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginResult { token, user })
    }

    /// Validates a bearer token into claims.
    pub fn authenticate(&self, token: &str) -> AppResult<AuthClaims> {
        self.codec.validate(token)
    }

    /// All users ordered by username. Any authenticated caller may list.
    pub async fn list_users(&self, ctx: &RequestContext) -> AppResult<Vec<User>> {
        self.users.list(&ctx.cancel).await
    }

    /// Creates a user with a freshly hashed password. The hasher enforces
    /// the password policy.
    pub async fn register_user(
        &self,
        cancel: &CancellationToken,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::validation(format!(
                "username must be 1 to {MAX_USERNAME_LEN} characters"
            )));
        }
        let input = CreateUser {
            username: username.to_string(),
            password_hash: self.hasher.hash_password(password)?,
            role,
        };
        let user = self.users.create(cancel, &input).await?;
        info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warehouse_database::MemoryStore;

    fn setup() -> IdentityService {
        let hasher = Arc::new(PasswordHasher::new());
        IdentityService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ClaimsCodec::with_secret(b"test-secret", Duration::hours(1))),
            hasher.clone(),
            hasher,
        )
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let svc = setup();
        let cancel = CancellationToken::new();
        let user = svc
            .register_user(&cancel, "alice", "correct-horse", UserRole::Manager)
            .await
            .unwrap();

        let result = svc.login(&cancel, "alice", "correct-horse").await.unwrap();
        assert_eq!(result.user.id, user.id);

        let claims = svc.authenticate(&result.token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_alike() {
        let svc = setup();
        let cancel = CancellationToken::new();
        svc.register_user(&cancel, "alice", "correct-horse", UserRole::Viewer)
            .await
            .unwrap();

        let unknown = svc.login(&cancel, "mallory", "whatever").await.unwrap_err();
        let wrong = svc.login(&cancel, "alice", "wrong-password").await.unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
        assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_and_duplicates() {
        let svc = setup();
        let cancel = CancellationToken::new();

        let err = svc
            .register_user(&cancel, "bob", "short", UserRole::Viewer)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        svc.register_user(&cancel, "bob", "long-enough", UserRole::Viewer)
            .await
            .unwrap();
        let err = svc
            .register_user(&cancel, "bob", "long-enough", UserRole::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_list_users_sorted() {
        let svc = setup();
        let cancel = CancellationToken::new();
        for name in ["carol", "alice"] {
            svc.register_user(&cancel, name, "long-enough", UserRole::Viewer)
                .await
                .unwrap();
        }
        let ctx = RequestContext::new(
            AuthClaims {
                user_id: uuid::Uuid::now_v7(),
                username: "carol".into(),
                role: UserRole::Viewer,
            },
            cancel,
        );

        let names: Vec<String> = svc
            .list_users(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "carol"]);
    }

    /// Records every verification it is asked to perform.
    #[derive(Default)]
    struct CountingVerifier {
        calls: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl CredentialVerifier for CountingVerifier {
        fn verify(&self, stored: Option<&str>, _plaintext: &str) -> AppResult<bool> {
            self.calls.lock().unwrap().push(stored.map(str::to_string));
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_unknown_user_still_verifies_a_password() {
        let verifier = Arc::new(CountingVerifier::default());
        let svc = IdentityService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ClaimsCodec::with_secret(b"test-secret", Duration::hours(1))),
            verifier.clone(),
            Arc::new(PasswordHasher::new()),
        );
        let cancel = CancellationToken::new();
        svc.register_user(&cancel, "alice", "correct-horse", UserRole::Viewer)
            .await
            .unwrap();

        svc.login(&cancel, "mallory", "whatever").await.unwrap_err();
        svc.login(&cancel, "alice", "whatever").await.unwrap_err();

        let calls = verifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], None);
        assert!(calls[1].as_deref().is_some_and(|h| h.starts_with("$argon2id$")));
    }

    #[test]
    fn test_authenticate_rejects_garbage() {
        let err = setup().authenticate("not-a-token").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenInvalid);
    }
}
