//! Request context carrying the verified caller and the cancellation signal.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use warehouse_entity::user::{AuthClaims, UserRole};

/// Context for the current authenticated request.
///
/// Built by the HTTP layer from validated claims and passed into every
/// service method, so each operation knows who is acting and when to stop.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Verified identity of the caller.
    pub claims: AuthClaims,
    /// Fires when the caller goes away or the request deadline elapses.
    pub cancel: CancellationToken,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(claims: AuthClaims, cancel: CancellationToken) -> Self {
        Self {
            claims,
            cancel,
        }
    }

    /// The caller's user id.
    pub fn user_id(&self) -> Uuid {
        self.claims.user_id
    }

    /// The caller's role at the time the token was issued.
    pub fn role(&self) -> UserRole {
        self.claims.role
    }
}
