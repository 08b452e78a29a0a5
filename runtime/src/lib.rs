//! # Paybridge Runtime
//!
//! Process-level plumbing shared by the Paybridge crates.
//!
//! ## Core Components
//!
//! - **Logging**: tracing subscriber setup and the redaction façade used
//!   before anything user- or credential-shaped reaches a log line
//! - **Metrics**: Prometheus recorder plus typed recorders for token refresh
//!   and GraphQL traffic
//!
//! ## Example
//!
//! ```no_run
//! use paybridge_runtime::logging::{LogConfig, init_tracing};
//!
//! init_tracing(&LogConfig::from_env());
//! tracing::info!("admin backend starting");
//! ```

/// Tracing setup and sensitive-field redaction
pub mod logging;

/// Prometheus metrics for observability
pub mod metrics;

pub use logging::{LogConfig, init_tracing, mask_token, redact};
