//! Identity-provider token cache.
//!
//! The [`RefreshCoordinator`] hands out a valid session token per user,
//! fetching a new one only when the cached token is missing or about to
//! expire, and never running more than one fetch per user at a time.
//!
//! # Architecture
//!
//! ```text
//! get_token(user) ──► cache hit (expires_at > now + buffer)? ──► token
//!        │
//!        ▼ miss
//! in-flight refresh for user? ──► yes: await the shared refresh
//!        │ no
//!        ▼
//! global ceiling reached? ──► yes: back off, retry get_token
//!        │ no
//!        ▼
//! attempt limit reached? ──► yes: RefreshLimitExceeded (no fetch)
//!        │ no
//!        ▼
//! spawn refresh: fetch ─► derive expiry ─► encrypt (plaintext fallback) ─► cache
//! ```

pub mod coordinator;
pub mod expiry;
pub mod limiter;

pub use coordinator::RefreshCoordinator;
pub use expiry::{jwt_expiry_millis, token_expiry_millis};
pub use limiter::RefreshAttemptLimiter;

use crate::crypto::EncryptedToken;
use crate::state::UserId;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Cached credential body.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenPayload {
    /// Encrypted with the coordinator's cipher.
    Encrypted(EncryptedToken),
    /// Stored as-is because encryption failed.
    Plaintext(String),
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypted(encrypted) => f.debug_tuple("Encrypted").field(encrypted).finish(),
            Self::Plaintext(_) => f.write_str("Plaintext([REDACTED])"),
        }
    }
}

/// One user's cached token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    /// Token body.
    pub payload: TokenPayload,
    /// Expiry as epoch milliseconds.
    pub expires_at_ms: i64,
    /// Owner of the token.
    pub user_id: UserId,
    /// Whether `payload` is encrypted.
    pub encrypted: bool,
}

impl TokenData {
    /// Returns `true` if the token outlives `now + buffer`.
    #[must_use]
    pub fn is_valid(&self, now_ms: i64, buffer: Duration) -> bool {
        let buffer_ms = i64::try_from(buffer.as_millis()).unwrap_or(i64::MAX);
        self.expires_at_ms > now_ms.saturating_add(buffer_ms)
    }

    /// Returns `true` once the expiry instant has passed.
    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Process-wide refresh statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshMetrics {
    /// Refreshes started.
    pub total_refreshes: u64,
    /// Refreshes that produced a token.
    pub successful_refreshes: u64,
    /// Refreshes that failed or found no session.
    pub failed_refreshes: u64,
    /// Completion time of the most recent refresh.
    pub last_refresh_at: Option<DateTime<Utc>>,
    /// Running average refresh duration.
    pub average_duration: Duration,
}

impl RefreshMetrics {
    /// Fold one completed refresh into the statistics.
    pub fn record(&mut self, success: bool, at: DateTime<Utc>, duration: Duration) {
        self.total_refreshes += 1;
        if success {
            self.successful_refreshes += 1;
        } else {
            self.failed_refreshes += 1;
        }
        self.last_refresh_at = Some(at);

        let n = u128::from(self.total_refreshes);
        let average = (self.average_duration.as_nanos() * (n - 1) + duration.as_nanos()) / n;
        self.average_duration = Duration::from_nanos(u64::try_from(average).unwrap_or(u64::MAX));
    }

    /// Fraction of refreshes that succeeded, `None` before the first one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        (self.total_refreshes > 0)
            .then(|| self.successful_refreshes as f64 / self.total_refreshes as f64)
    }
}
