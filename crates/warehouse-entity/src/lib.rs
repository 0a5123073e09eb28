//! # warehouse-entity
//!
//! Domain entity models for Warehouse Control. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.
//!
//! The [`audit::diff`] module computes and parses the field-level deltas
//! stored with each audit entry.

pub mod audit;
pub mod item;
pub mod user;
