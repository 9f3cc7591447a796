//! Tunables of the shortening engine.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::utils::code_generator::DEFAULT_CODE_LENGTH;

/// Default bound on allocation attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Longest lifetime a mapping can be given, in hours (ten years).
pub const MAX_EXPIRY_HOURS: u64 = 87_600;

/// What to do when a URL that already has a live code is shortened again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Every request mints a fresh code.
    #[default]
    AlwaysNew,
    /// Return an existing live code for the identical URL.
    ReuseExisting,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always_new" | "always-new" | "new" => Ok(Self::AlwaysNew),
            "reuse_existing" | "reuse-existing" | "reuse" => Ok(Self::ReuseExisting),
            other => Err(format!(
                "unknown dedup policy '{other}', expected 'always_new' or 'reuse_existing'"
            )),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysNew => f.write_str("always_new"),
            Self::ReuseExisting => f.write_str("reuse_existing"),
        }
    }
}

/// Engine configuration shared by the services.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub code_length: usize,
    pub max_attempts: u32,
    /// Lifetime given to mappings when the caller does not choose one.
    /// `None` means mappings never expire by default.
    pub default_expiry: Option<Duration>,
    pub dedup_policy: DedupPolicy,
    /// Upper bound on how long a resolved URL stays in the redirect cache.
    pub cache_ttl_seconds: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_expiry: Some(Duration::hours(24)),
            dedup_policy: DedupPolicy::AlwaysNew,
            cache_ttl_seconds: 3600,
        }
    }
}
