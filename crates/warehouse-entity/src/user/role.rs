//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of roles. Which operations each role may perform is decided
/// by the access policy in `warehouse-auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access, including deletes.
    Admin,
    /// Can create and update items and read the audit trail.
    Manager,
    /// Read-only access to items.
    Viewer,
}

impl UserRole {
    /// Every role, in descending privilege.
    pub const ALL: [UserRole; 3] = [Self::Admin, Self::Manager, Self::Viewer];

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = warehouse_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "viewer" => Ok(Self::Viewer),
            _ => Err(warehouse_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, manager, viewer"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("viewer".parse::<UserRole>().unwrap(), UserRole::Viewer);
        assert!("superuser".parse::<UserRole>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_unknown_role_fails_to_deserialize() {
        assert!(serde_json::from_str::<UserRole>("\"creator\"").is_err());
        assert_eq!(
            serde_json::from_str::<UserRole>("\"manager\"").unwrap(),
            UserRole::Manager
        );
    }

    #[test]
    fn test_display_round_trips() {
        for role in UserRole::ALL {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }
}
