//! Audit trail entities and the field-level diff codec.

pub mod diff;
pub mod model;

pub use diff::{Diff, DiffError, FieldChange, FieldDelta};
pub use model::{AuditAction, AuditCriteria, AuditEntry, AuditFilter, AuditRecord, NewAuditEntry};

/// Column names used by audit queries. The audit table is aliased `a`.
pub mod columns {
    /// Audited item.
    pub const ITEM_ID: &str = "a.item_id";
    /// Acting user.
    pub const CHANGED_BY: &str = "a.changed_by";
    /// Action kind, compared as text.
    pub const ACTION: &str = "a.action::text";
    /// Time of the change.
    pub const CHANGED_AT: &str = "a.changed_at";
}
