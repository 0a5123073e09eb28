//! Access checks run before every gated store call.

use warehouse_core::{AppError, AppResult};
use warehouse_entity::user::{AuthClaims, UserRole};

use super::policies::{Operation, PolicyTable};

/// Decides whether a caller may perform an operation.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    /// The role table.
    table: PolicyTable,
}

impl AccessPolicy {
    /// Creates a policy with the standard role table.
    pub fn new() -> Self {
        Self {
            table: PolicyTable::new(),
        }
    }

    /// Whether `role` may perform `operation`.
    pub fn can(&self, role: UserRole, operation: Operation) -> bool {
        self.table.permits(role, operation)
    }

    /// Returns `Ok(())` if allowed, or a `Forbidden` error if denied.
    pub fn require(&self, claims: &AuthClaims, operation: Operation) -> AppResult<()> {
        if self.can(claims.role, operation) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %claims.user_id,
                role = %claims.role,
                operation = %operation,
                "Access denied"
            );
            Err(AppError::forbidden(format!(
                "Role '{}' may not perform '{operation}'",
                claims.role
            )))
        }
    }
}
