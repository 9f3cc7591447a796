//! Helpers shared by the services.
//!
//! - [`code_generator`] - Code generation and the code syntax policy
//! - [`url_validator`] - Long URL validation

pub mod code_generator;
pub mod url_validator;
