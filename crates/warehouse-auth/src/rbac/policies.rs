//! Role-to-operation mapping definitions.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use warehouse_entity::user::UserRole;

/// A gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create items.
    Create,
    /// Update items.
    Update,
    /// Delete items.
    Delete,
    /// Read items.
    View,
    /// Read the audit trail.
    ViewAudit,
    /// Export the audit trail.
    Export,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 6] = [
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::View,
        Self::ViewAudit,
        Self::Export,
    ];

    /// Return the operation as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::View => "view",
            Self::ViewAudit => "view_audit",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role → permitted operations table.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    /// Role → set of operations.
    policies: HashMap<UserRole, HashSet<Operation>>,
}

impl PolicyTable {
    /// Creates the standard table.
    pub fn new() -> Self {
        use Operation::*;

        let mut policies = HashMap::new();

        // Viewer: read-only item access
        policies.insert(UserRole::Viewer, HashSet::from([View]));

        // Manager: everything except deletes
        policies.insert(
            UserRole::Manager,
            HashSet::from([Create, Update, View, ViewAudit, Export]),
        );

        // Admin: everything
        policies.insert(UserRole::Admin, Operation::ALL.into_iter().collect());

        Self { policies }
    }

    /// Checks whether the given role may perform the operation.
    pub fn permits(&self, role: UserRole, operation: Operation) -> bool {
        self.policies
            .get(&role)
            .is_some_and(|ops| ops.contains(&operation))
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new()
    }
}
