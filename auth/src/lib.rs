//! # Paybridge Authentication & Authorization
//!
//! Authentication plumbing for the payroll admin backend:
//!
//! - **RBAC**: [`rbac::AuthContext`] derives permission answers from the
//!   signed-in user's database record using a fixed role table
//! - **Token cache**: [`tokens::RefreshCoordinator`] caches identity-provider
//!   session tokens per user, encrypted in memory, with coalesced and
//!   rate-limited refreshes
//! - **Testable**: clock, cipher and fetcher are injected; mocks live in
//!   [`mocks`] behind the default `test-utils` feature
//!
//! ## Example: permission check
//!
//! ```
//! use paybridge_auth::rbac::AuthContext;
//!
//! let ctx = AuthContext::anonymous();
//! assert!(!ctx.has_permission("view_dashboard"));
//! ```
//!
//! ## Example: bearer token for a GraphQL call
//!
//! ```rust,ignore
//! let coordinator = RefreshCoordinator::with_defaults();
//! let _sweep = coordinator.spawn_expiry_sweep();
//!
//! let token = coordinator.get_token(&session_fetcher, &user_id).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod crypto;
pub mod error;
pub mod providers;
pub mod rbac;
pub mod state;
pub mod tokens;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use config::TokenCacheConfig;
pub use crypto::{AesGcmTokenCipher, TokenCipher};
pub use error::{AuthError, Result};
pub use providers::TokenFetcher;
pub use rbac::AuthContext;
pub use state::{Permission, Role, UserId, UserRecord};
pub use tokens::{RefreshCoordinator, RefreshMetrics, TokenData};
