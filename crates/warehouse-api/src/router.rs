//! Route definitions for the Warehouse Control HTTP API.
//!
//! Resource routes are mounted under `/api`; `/health` sits at the root.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, without middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(item_routes())
        .merge(audit_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health::health))
        .with_state(state)
}

/// Login and user listing
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/users", get(handlers::auth::list_users))
}

/// Item CRUD and per-item history
fn item_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/items/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route("/items/{id}/audit", get(handlers::audit::item_history))
}

/// Audit listing and CSV export
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/audit", get(handlers::audit::list_audit))
        .route("/audit/export", get(handlers::audit::export_audit))
}
