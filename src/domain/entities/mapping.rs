//! Url mapping entity: the persisted association between a code and a URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed short code mapping.
///
/// `code` and `original_url` never change after creation; only `hit_count`
/// moves, and only upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub hit_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlMapping {
    /// Creates a mapping from its stored columns.
    pub fn new(
        code: String,
        original_url: String,
        created_at: DateTime<Utc>,
        hit_count: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code,
            original_url,
            created_at,
            hit_count,
            expires_at,
        }
    }

    /// Returns true once `now` is past `expires_at`; the instant itself is
    /// still live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now > e)
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input for [`crate::domain::repositories::MappingStore::insert_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewMapping {
    pub code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewMapping {
    pub fn new(code: String, original_url: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            code,
            original_url,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// The mapping as it looks right after commit.
    pub fn into_mapping(self) -> UrlMapping {
        UrlMapping::new(
            self.code,
            self.original_url,
            self.created_at,
            0,
            self.expires_at,
        )
    }
}
