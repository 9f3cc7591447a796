//! DTOs for the shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::ShortenedLink;

/// Request to shorten a single URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten. Format is checked by the link service.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Optional caller-chosen code.
    #[serde(default, alias = "custom_code")]
    #[validate(length(min = 4, max = 32, message = "Custom code must be 4-32 characters"))]
    pub short: Option<String>,

    /// Lifetime in hours. Omitted uses the server default, `0` never expires.
    #[serde(default)]
    #[validate(range(max = 87_600, message = "Expiry must be at most 87600 hours"))]
    pub expiry: Option<u64>,
}

/// A shortened link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub url: String,
    /// Full short URL.
    pub short: String,
    pub code: String,
    /// Lifetime in whole hours, `null` when the link never expires.
    pub expiry: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<ShortenedLink> for ShortenResponse {
    fn from(link: ShortenedLink) -> Self {
        let mapping = link.mapping;
        let expiry = mapping
            .expires_at
            .map(|at| ((at - mapping.created_at).num_seconds() + 1800) / 3600);

        Self {
            url: mapping.original_url,
            short: link.short_url,
            code: mapping.code,
            expiry,
            expires_at: mapping.expires_at,
        }
    }
}
