//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 365 * 24 * 60;

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric secret for JWT signing (HMAC-SHA256).
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl AuthConfig {
    /// Token lifetime as a [`chrono::Duration`], capped at
    /// [`MAX_TOKEN_TTL_MINUTES`].
    pub fn token_ttl(&self) -> chrono::Duration {
        let minutes = self.token_ttl_minutes.min(MAX_TOKEN_TTL_MINUTES);
        i64::try_from(minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or(chrono::Duration::zero())
    }
}

fn default_token_ttl() -> u64 {
    24 * 60
}
