//! Item catalogue operations.

pub mod service;

pub use service::InventoryService;
