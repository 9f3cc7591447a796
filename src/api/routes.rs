//! API route configuration.

use crate::api::handlers::{delete_link_handler, link_info_handler, shorten_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Versioned API routes.
///
/// # Endpoints
///
/// - `POST   /api/v1`               - Shorten a URL
/// - `GET    /api/v1/links/{code}`  - Mapping details with hit count
/// - `DELETE /api/v1/links/{code}`  - Remove a mapping
pub fn v1_routes() -> Router<AppState> {
    Router::new().route("/api/v1", post(shorten_handler)).route(
        "/api/v1/links/{code}",
        get(link_info_handler).delete(delete_link_handler),
    )
}
