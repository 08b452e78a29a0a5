//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for:
//! - Token refresh attempts, outcomes and latency
//! - Token cache maintenance (expiry sweeps, encryption fallbacks)
//! - GraphQL requests and classified errors
//!
//! # Example
//!
//! ```rust,no_run
//! use paybridge_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new();
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Installs the global recorder and renders the scrape text on demand. The
/// HTTP route serving the text belongs to whichever web layer hosts it.
#[derive(Default)]
pub struct MetricsServer {
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server with no recorder installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the metrics exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), the call
    /// succeeds without a handle and `render` returns `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed, serve render() from the host's /metrics route");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Token refresh
    describe_counter!(
        "token_refresh_total",
        "Total number of token refresh attempts"
    );
    describe_counter!(
        "token_refresh_success_total",
        "Total number of successful token refreshes"
    );
    describe_counter!(
        "token_refresh_failure_total",
        "Total number of failed token refreshes"
    );
    describe_counter!(
        "token_refresh_rate_limited_total",
        "Refreshes rejected because the per-user attempt limit was reached"
    );
    describe_histogram!(
        "token_refresh_duration_seconds",
        "Time taken to fetch and cache a fresh token"
    );

    // Token cache
    describe_gauge!(
        "token_cache_entries",
        "Number of users with a cached token"
    );
    describe_counter!(
        "token_cache_hits_total",
        "Token requests served from cache"
    );
    describe_counter!(
        "token_cache_entries_swept_total",
        "Expired cache entries removed by the background sweep"
    );
    describe_counter!(
        "token_encryption_fallback_total",
        "Tokens cached in plaintext because encryption failed"
    );

    // GraphQL
    describe_counter!(
        "graphql_requests_total",
        "Total number of GraphQL requests sent to Hasura"
    );
    describe_counter!(
        "graphql_errors_total",
        "GraphQL responses carrying errors, by classified kind"
    );
    describe_histogram!(
        "graphql_request_duration_seconds",
        "Round-trip time of GraphQL requests"
    );
}

/// Token refresh and cache metrics recorder.
pub struct TokenMetrics;

impl TokenMetrics {
    /// Record the start of a refresh attempt.
    pub fn record_attempt() {
        counter!("token_refresh_total").increment(1);
    }

    /// Record a successful refresh.
    pub fn record_success(duration: Duration) {
        counter!("token_refresh_success_total").increment(1);
        histogram!("token_refresh_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed refresh.
    pub fn record_failure(duration: Duration) {
        counter!("token_refresh_failure_total").increment(1);
        histogram!("token_refresh_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a refresh rejected by the attempt limiter.
    pub fn record_rate_limited() {
        counter!("token_refresh_rate_limited_total").increment(1);
    }

    /// Record a cache hit.
    pub fn record_cache_hit() {
        counter!("token_cache_hits_total").increment(1);
    }

    /// Record the current cache size.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_cache_size(entries: usize) {
        gauge!("token_cache_entries").set(entries as f64);
    }

    /// Record entries removed by an expiry sweep.
    pub fn record_swept(count: usize) {
        counter!("token_cache_entries_swept_total").increment(count as u64);
    }

    /// Record a plaintext fallback after an encryption failure.
    pub fn record_encryption_fallback() {
        counter!("token_encryption_fallback_total").increment(1);
    }
}

/// GraphQL metrics recorder.
pub struct GraphQlMetrics;

impl GraphQlMetrics {
    /// Record a completed request.
    pub fn record_request(operation: &str, duration: Duration) {
        counter!("graphql_requests_total", "operation" => operation.to_string()).increment(1);
        histogram!("graphql_request_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a response carrying errors of the given kind.
    pub fn record_error(kind: &'static str) {
        counter!("graphql_errors_total", "kind" => kind).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_server_creation() {
        let server = MetricsServer::new();
        assert!(server.handle().is_none());
    }

    #[tokio::test]
    async fn test_metrics_server_start() {
        let mut server = MetricsServer::new();

        let result = server.start();
        assert!(result.is_ok());
        // handle might be None if another test already installed the recorder
    }

    #[tokio::test]
    async fn test_token_metrics_render() {
        let mut server = MetricsServer::new();
        server.start().unwrap();

        TokenMetrics::record_attempt();
        TokenMetrics::record_success(Duration::from_millis(120));
        TokenMetrics::record_swept(2);

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("token_refresh_total"));
            assert!(rendered.contains("token_refresh_success_total"));
            assert!(rendered.contains("token_cache_entries_swept_total"));
        }
    }

    #[tokio::test]
    async fn test_graphql_metrics_render() {
        let mut server = MetricsServer::new();
        server.start().unwrap();

        GraphQlMetrics::record_request("GetPayrolls", Duration::from_millis(40));
        GraphQlMetrics::record_error("authentication");

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("graphql_requests_total"));
            assert!(rendered.contains("graphql_errors_total"));
        }
    }
}
