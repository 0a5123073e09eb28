//! Audit trail queries and CSV export.

pub mod export;
pub mod service;

pub use export::{AUDIT_CSV_HEADER, write_audit_csv};
pub use service::{AuditEntryView, AuditService};
