//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// Resolution goes through [`crate::application::services::ResolutionService`]:
/// the redirect cache first, then the mapping store. Hits are counted in the
/// background and never delay the redirect.
///
/// # Errors
///
/// Returns 404 Not Found for unknown, malformed or expired codes and 503 if
/// the store cannot be reached.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    match state.resolution_service.resolve(&code).await? {
        Some(url) => Ok(Redirect::temporary(&url)),
        None => {
            debug!(code = %code, "Short link not found");
            Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ))
        }
    }
}
