//! Verified identity carried through every gated operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::User;
use super::role::UserRole;

/// Identity and role decoded from a validated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// The authenticated user's login name.
    pub username: String,
    /// The authenticated user's role.
    pub role: UserRole,
}

impl From<&User> for AuthClaims {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}
