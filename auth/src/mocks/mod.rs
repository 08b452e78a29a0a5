//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the provider
//! traits for use in unit and integration tests.

pub mod cipher;
pub mod token_fetcher;

pub use cipher::MockTokenCipher;
pub use token_fetcher::MockTokenFetcher;
