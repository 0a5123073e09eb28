//! Item handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use warehouse_core::types::Page;
use warehouse_entity::item::Item;

use crate::dto::request::{CreateItemRequest, ListItemsQuery, UpdateItemRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{ApiQuery, AuthUser, ValidatedJson, parse_uuid};
use crate::state::AppState;

/// GET /api/items
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListItemsQuery>,
) -> Result<Json<ApiResponse<Page<Item>>>, ApiError> {
    let page = state
        .inventory
        .list_items(&auth, query.search, query.page, query.page_size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Item>>), ApiError> {
    let item = state.inventory.create_item(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

/// GET /api/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let id = parse_uuid(&id)?;
    let item = state.inventory.get_item(&auth, id).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// PUT /api/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateItemRequest>,
) -> Result<Json<ApiResponse<Item>>, ApiError> {
    let id = parse_uuid(&id)?;
    let item = state.inventory.update_item(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// DELETE /api/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id)?;
    state.inventory.delete_item(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
