//! # warehouse-core
//!
//! Core crate for Warehouse Control. Contains configuration schemas,
//! pagination normalization, the parameterized query builder shared by
//! every list endpoint, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Warehouse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
