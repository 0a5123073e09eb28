//! # warehouse-service
//!
//! Business logic for Warehouse Control. Every gated operation runs the
//! same sequence: authorize the caller's role, validate the input, call the
//! store, and let the store's error translation stand.
//!
//! Services receive their stores as `Arc<dyn ...>` capabilities at
//! construction time, so tests run them over the in-memory store.

pub mod audit;
pub mod context;
pub mod identity;
pub mod inventory;

pub use audit::{AuditEntryView, AuditService};
pub use context::RequestContext;
pub use identity::{IdentityService, LoginResult};
pub use inventory::InventoryService;
