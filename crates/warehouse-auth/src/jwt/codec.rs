//! Token creation and validation with a symmetric secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use warehouse_core::config::auth::AuthConfig;
use warehouse_core::{AppError, AppResult, ErrorKind};
use warehouse_entity::user::AuthClaims;

use super::claims::TokenClaims;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and validates HS256-signed tokens.
#[derive(Clone)]
pub struct ClaimsCodec {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation rules: HS256 only, expiry enforced without leeway.
    validation: Validation,
    /// Token lifetime.
    ttl: Duration,
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("validation", &self.validation)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ClaimsCodec {
    /// Creates a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_secret(config.jwt_secret.as_bytes(), config.token_ttl())
    }

    /// Creates a codec from a raw secret and lifetime.
    pub fn with_secret(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for the given identity, valid from now for the
    /// configured lifetime.
    pub fn issue(&self, identity: &AuthClaims) -> AppResult<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(&self, identity: &AuthClaims, issued_at: DateTime<Utc>) -> AppResult<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("Token expiry is out of range"))?;
        let claims = TokenClaims {
            sub: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode token", e))
    }

    /// Validate a token and return the identity it carries.
    ///
    /// Every failure (signature, algorithm, expiry, payload shape, role,
    /// subject id) is reported as the same `TokenInvalid` error.
    pub fn validate(&self, token: &str) -> AppResult<AuthClaims> {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims.into()),
            Err(e) => {
                debug!(reason = ?e.kind(), "Token rejected");
                Err(AppError::token_invalid())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use warehouse_entity::user::UserRole;

    fn codec(secret: &str) -> ClaimsCodec {
        ClaimsCodec::with_secret(secret.as_bytes(), Duration::hours(1))
    }

    fn identity(role: UserRole) -> AuthClaims {
        AuthClaims {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            role,
        }
    }

    #[test]
    fn test_round_trip_for_every_role() {
        let codec = codec("secret");
        for role in UserRole::ALL {
            let who = identity(role);
            let token = codec.issue(&who).unwrap();
            assert_eq!(codec.validate(&token).unwrap(), who);
        }
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let codec = codec("secret");
        let token = codec
            .issue_at(&identity(UserRole::Admin), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(codec.validate(&token).unwrap_err().kind, ErrorKind::TokenInvalid);
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let codec = ClaimsCodec::with_secret(b"secret", Duration::MAX);
        let err = codec.issue(&identity(UserRole::Viewer)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_other_secret_is_invalid() {
        let token = codec("secret").issue(&identity(UserRole::Viewer)).unwrap();
        assert_eq!(
            codec("another").validate(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
    }

    #[test]
    fn test_malformed_strings_are_invalid() {
        let codec = codec("secret");
        for garbage in ["", "abc", "a.b.c", "....", "eyJhbGciOiJIUzI1NiJ9.e30.x"] {
            assert_eq!(
                codec.validate(garbage).unwrap_err().kind,
                ErrorKind::TokenInvalid
            );
        }
    }

    #[test]
    fn test_other_algorithm_is_invalid() {
        let who = identity(UserRole::Admin);
        let now = Utc::now();
        let claims = TokenClaims {
            sub: who.user_id,
            username: who.username,
            role: who.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(
            codec("secret").validate(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
    }

    #[test]
    fn test_unknown_role_and_bad_subject_are_invalid() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let key = EncodingKey::from_secret(b"secret");

        let bad_role = serde_json::json!({
            "sub": Uuid::new_v4(), "username": "x", "role": "superuser",
            "iat": 0, "exp": exp
        });
        let token = encode(&Header::new(ALGORITHM), &bad_role, &key).unwrap();
        assert!(codec("secret").validate(&token).is_err());

        let bad_sub = serde_json::json!({
            "sub": "not-a-uuid", "username": "x", "role": "admin",
            "iat": 0, "exp": exp
        });
        let token = encode(&Header::new(ALGORITHM), &bad_sub, &key).unwrap();
        assert_eq!(
            codec("secret").validate(&token).unwrap_err().kind,
            ErrorKind::TokenInvalid
        );
    }
}
