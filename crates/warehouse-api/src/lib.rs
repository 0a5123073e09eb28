//! # warehouse-api
//!
//! HTTP API layer for Warehouse Control built on Axum.
//!
//! Provides the REST endpoints, the bearer-token extractor, request
//! logging and request-id middleware, DTOs, and the mapping from
//! [`warehouse_core::ErrorKind`] to HTTP status codes.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use error::ApiError;
pub use state::AppState;
