//! Inventory item entities.

pub mod model;

pub use model::{CreateItem, Item, ItemFilter, UpdateItem};

/// Column names used by item queries. Shared by the SQL store and the
/// in-process store so both evaluate filters identically.
pub mod columns {
    /// Item display name.
    pub const NAME: &str = "name";
    /// Stock-keeping unit.
    pub const SKU: &str = "sku";
    /// Creation timestamp.
    pub const CREATED_AT: &str = "created_at";
}
