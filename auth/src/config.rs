//! Token cache configuration.
//!
//! Values default to the production policy; tests and embedding
//! applications override them through the `with_*` builders.

use std::time::Duration;

/// Refresh coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCacheConfig {
    /// A cached token is only served while it has more than this long left.
    ///
    /// Default: 2 minutes
    pub expiry_buffer: Duration,

    /// Lifetime assumed when a token carries no readable `exp` claim.
    ///
    /// Default: 55 minutes
    pub default_token_lifetime: Duration,

    /// Maximum refresh attempts per user inside `attempt_window`.
    ///
    /// Default: 3
    pub max_refresh_attempts: u32,

    /// Rolling window for `max_refresh_attempts`.
    ///
    /// Default: 5 minutes
    pub attempt_window: Duration,

    /// Maximum refreshes in flight across all users.
    ///
    /// Default: 3
    pub max_concurrent_refreshes: usize,

    /// How long a caller waits when the concurrency ceiling is reached.
    ///
    /// Default: 1 second
    pub saturation_backoff: Duration,

    /// Period of the background expiry sweep.
    ///
    /// Default: 5 minutes
    pub sweep_interval: Duration,
}

impl TokenCacheConfig {
    /// Create a configuration with production defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expiry_buffer: Duration::from_secs(2 * 60),
            default_token_lifetime: Duration::from_secs(55 * 60),
            max_refresh_attempts: 3,
            attempt_window: Duration::from_secs(5 * 60),
            max_concurrent_refreshes: 3,
            saturation_backoff: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }

    /// Set the expiry buffer.
    #[must_use]
    pub const fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    /// Set the fallback token lifetime.
    #[must_use]
    pub const fn with_default_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_token_lifetime = lifetime;
        self
    }

    /// Set the per-user attempt limit and its window.
    #[must_use]
    pub const fn with_attempt_limit(mut self, max_attempts: u32, window: Duration) -> Self {
        self.max_refresh_attempts = max_attempts;
        self.attempt_window = window;
        self
    }

    /// Set the global concurrency ceiling and the backoff applied above it.
    #[must_use]
    pub const fn with_concurrency_limit(mut self, max_in_flight: usize, backoff: Duration) -> Self {
        self.max_concurrent_refreshes = max_in_flight;
        self.saturation_backoff = backoff;
        self
    }

    /// Set the background sweep period.
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for TokenCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_refresh_policy() {
        let config = TokenCacheConfig::default();
        assert_eq!(config.expiry_buffer, Duration::from_secs(120));
        assert_eq!(config.default_token_lifetime, Duration::from_secs(3300));
        assert_eq!(config.max_refresh_attempts, 3);
        assert_eq!(config.attempt_window, Duration::from_secs(300));
        assert_eq!(config.max_concurrent_refreshes, 3);
        assert_eq!(config.saturation_backoff, Duration::from_secs(1));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let config = TokenCacheConfig::new()
            .with_attempt_limit(5, Duration::from_secs(60))
            .with_concurrency_limit(1, Duration::from_millis(250));
        assert_eq!(config.max_refresh_attempts, 5);
        assert_eq!(config.attempt_window, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_refreshes, 1);
        assert_eq!(config.saturation_backoff, Duration::from_millis(250));
    }
}
