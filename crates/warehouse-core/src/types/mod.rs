//! Core type definitions used across the Warehouse workspace.

pub mod filter;
pub mod pagination;

pub use filter::{BindValue, Bound, FieldSource, Predicate, QueryFilterBuilder, QueryPlan};
pub use pagination::{Page, PageRequest, calc_total_pages};
