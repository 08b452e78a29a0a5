//! # Paybridge Hasura Client
//!
//! GraphQL-over-HTTP client for the Hasura backend, with bearer tokens from
//! the token cache and a small error taxonomy that tells callers how to
//! recover.
//!
//! ## Example
//!
//! ```no_run
//! use paybridge_graphql::{Authorization, GraphQlRequest, HasuraClient};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads NEXT_PUBLIC_HASURA_GRAPHQL_URL and HASURA_GRAPHQL_ADMIN_SECRET
//!     let client = HasuraClient::from_env()?;
//!
//!     let request = GraphQlRequest::new("query Clients($limit: Int!) { clients(limit: $limit) { id name } }")
//!         .with_variables(json!({ "limit": 10 }))
//!         .with_operation_name("Clients");
//!
//!     let data: Value = client.execute(&request, &client.admin()?).await?;
//!     println!("{data}");
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! | Kind | Recovery |
//! |------|----------|
//! | `Authentication` | refresh the token, retry once |
//! | `Permission` | degrade to fallback data |
//! | `Network`, `Other` | surface with a manual retry |

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use classify::{ErrorKind, Recovery, classify, is_auth_error, is_permission_error};
pub use client::{Authorization, HasuraClient};
pub use config::HasuraConfig;
pub use error::{GraphQlError, Result};
pub use types::{GraphQlErrorEntry, GraphQlRequest, GraphQlResponse};
