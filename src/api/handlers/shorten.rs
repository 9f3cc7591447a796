//! Handler for link shortening endpoint.

use axum::{Json, extract::State};
use chrono::Duration;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::ShortenOptions;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for one URL.
///
/// # Endpoint
///
/// `POST /api/v1`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "short": "promo2025",   // optional custom code
///   "expiry": 48            // optional, hours; 0 = never expires
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "short": "https://s.example.com/promo2025",
///   "code": "promo2025",
///   "expiry": 48,
///   "expires_at": "2025-01-03T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request for an invalid URL, custom code or expiry
/// - 409 Conflict if the custom code is taken
/// - 503 Service Unavailable (with `Retry-After`) if no code could be
///   allocated or the store is down
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let options = ShortenOptions {
        custom_code: payload.short,
        expires_in: payload.expiry.map(|hours| match hours {
            0 => None,
            h => Some(Duration::hours(h as i64)),
        }),
    };

    let link = state
        .link_service
        .shorten_with(&payload.url, options)
        .await?;

    Ok(Json(link.into()))
}
