//! JWT claims structure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warehouse_entity::user::{AuthClaims, UserRole};

/// JWT claims payload embedded in every token.
///
/// `role` deserializes into the closed [`UserRole`] enumeration, so a token
/// carrying any other role string fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the user ID.
    pub sub: Uuid,
    /// Username at issue time.
    pub username: String,
    /// User role at issue time.
    pub role: UserRole,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl From<TokenClaims> for AuthClaims {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}
