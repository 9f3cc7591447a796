//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for mapping persistence and redirect caching.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - Mapping store backends (memory, PostgreSQL, Redis)

pub mod cache;
pub mod persistence;
