//! Handlers for single-link management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api::dto::link::LinkInfoResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns a live mapping with its hit count.
///
/// `GET /api/v1/links/{code}`
pub async fn link_info_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkInfoResponse>, AppError> {
    let mapping = state.link_service.link_info(&code).await?;
    let short_url = state.link_service.short_url(&mapping.code);

    Ok(Json(LinkInfoResponse::new(mapping, short_url)))
}

/// Deletes a mapping.
///
/// `DELETE /api/v1/links/{code}` responds with 204 No Content, or 404 if
/// nothing was stored under `code`.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
