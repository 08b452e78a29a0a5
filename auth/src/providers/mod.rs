//! Authentication providers.
//!
//! This module defines traits for the external dependencies used by the
//! token cache. These traits enable dependency injection and make the cache
//! logic testable without a live identity provider.
//!
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Wrap the identity provider's session API

pub mod token_fetcher;

// Re-export provider traits
pub use token_fetcher::{FnFetcher, TokenFetcher, fetcher_fn};
