//! Core domain entities.
//!
//! - [`UrlMapping`] - A committed code to URL association
//! - [`NewMapping`] - Input for creating one

pub mod mapping;

pub use mapping::{NewMapping, UrlMapping};
