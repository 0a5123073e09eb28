//! Audit trail handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use warehouse_core::types::Page;
use warehouse_service::AuditEntryView;

use crate::dto::request::AuditQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{ApiQuery, AuthUser, parse_uuid};
use crate::state::AppState;

/// GET /api/items/{id}/audit
pub async fn item_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<AuditEntryView>>>, ApiError> {
    let id = parse_uuid(&id)?;
    let entries = state.audit.item_history(&auth, id).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/audit
pub async fn list_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Json<ApiResponse<Page<AuditEntryView>>>, ApiError> {
    let page = state
        .audit
        .list(&auth, &query.filter(), query.page, query.page_size)
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/audit/export
pub async fn export_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Response, ApiError> {
    let mut body = Vec::new();
    state.audit.export(&auth, &query.filter(), &mut body).await?;

    let disposition = format!(
        "attachment; filename=\"audit_{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
