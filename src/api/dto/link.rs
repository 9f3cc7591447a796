//! DTO for the link lookup endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::UrlMapping;

/// A stored mapping together with its hit counter.
#[derive(Debug, Serialize)]
pub struct LinkInfoResponse {
    pub code: String,
    pub url: String,
    pub short_url: String,
    pub hit_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkInfoResponse {
    pub fn new(mapping: UrlMapping, short_url: String) -> Self {
        Self {
            code: mapping.code,
            url: mapping.original_url,
            short_url,
            hit_count: mapping.hit_count,
            created_at: mapping.created_at,
            expires_at: mapping.expires_at,
        }
    }
}
