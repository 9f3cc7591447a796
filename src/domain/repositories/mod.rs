//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`MappingStore`] - Code to URL mappings with atomic primitives

pub mod mapping_store;

pub use mapping_store::{MappingStore, StoreError, StoreResult};

#[cfg(test)]
pub use mapping_store::MockMappingStore;
