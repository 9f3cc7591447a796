//! Business logic services for the application layer.

pub mod allocator;
pub mod link_service;
pub mod resolution_service;

pub use allocator::CodeAllocator;
pub use link_service::{LinkService, ShortenOptions, ShortenedLink};
pub use resolution_service::ResolutionService;
