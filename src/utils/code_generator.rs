//! Short code generation and syntactic validation.
//!
//! Codes are drawn from the 62-symbol alphabet `0-9A-Za-z`. With the default
//! length of 7 the space holds 62^7 (about 3.5 * 10^12) codes.

use rand::Rng;
use serde_json::json;

use crate::error::AppError;

/// Symbols a code may contain.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of generated codes when not configured.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Bounds for the configured generated length.
pub const MIN_GENERATED_LENGTH: usize = 6;
pub const MAX_GENERATED_LENGTH: usize = 16;

/// Bounds for caller-chosen codes.
pub const MIN_CUSTOM_LENGTH: usize = 4;
pub const MAX_CUSTOM_LENGTH: usize = 32;

/// Codes that would shadow service routes.
const RESERVED_CODES: &[&str] = &["api", "health"];

/// Produces candidate codes for the allocator.
///
/// `attempt` counts up from zero for each allocation so implementations can
/// vary their output after a collision. Generation never fails.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, long_url: &str, attempt: u32) -> String;
}

/// Uniformly random codes from the thread-local RNG.
///
/// Every call draws fresh entropy, so the URL and attempt are not needed.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_GENERATED_LENGTH, MAX_GENERATED_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, _long_url: &str, _attempt: u32) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Returns true if every byte of `code` is in [`ALPHABET`].
fn is_base62(code: &str) -> bool {
    code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Which strings can ever name a mapping.
///
/// Resolution checks [`CodePolicy::is_valid`] before touching the store, so
/// anything outside the policy is "not found" without a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    generated_length: usize,
}

impl CodePolicy {
    pub fn new(generated_length: usize) -> Self {
        Self {
            generated_length: generated_length.clamp(MIN_GENERATED_LENGTH, MAX_GENERATED_LENGTH),
        }
    }

    /// Syntactic check for any code the service could have issued.
    pub fn is_valid(&self, code: &str) -> bool {
        let len = code.len();
        let fits = len == self.generated_length
            || (MIN_CUSTOM_LENGTH..=MAX_CUSTOM_LENGTH).contains(&len);

        fits && is_base62(code)
    }

    /// Returns true if `code` collides with a route name.
    pub fn is_reserved(&self, code: &str) -> bool {
        RESERVED_CODES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(code))
    }

    /// Validates a caller-chosen code.
    ///
    /// # Rules
    ///
    /// - Length: 4-32 characters
    /// - Allowed characters: ASCII letters and digits
    /// - Cannot be a reserved route name
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if any rule is violated.
    pub fn validate_custom(&self, code: &str) -> Result<(), AppError> {
        if !(MIN_CUSTOM_LENGTH..=MAX_CUSTOM_LENGTH).contains(&code.len()) {
            return Err(AppError::bad_request(
                format!(
                    "Custom code must be {}-{} characters",
                    MIN_CUSTOM_LENGTH, MAX_CUSTOM_LENGTH
                ),
                json!({ "provided_length": code.len() }),
            ));
        }

        if !is_base62(code) {
            return Err(AppError::bad_request(
                "Custom code can only contain letters and digits",
                json!({ "code": code }),
            ));
        }

        if self.is_reserved(code) {
            return Err(AppError::bad_request(
                "This code is reserved",
                json!({ "code": code }),
            ));
        }

        Ok(())
    }
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}
