//! Per-user refresh attempt limiting.
//!
//! Caps how often a single user may hit the identity provider so a
//! misbehaving provider (or a token that is rejected as soon as it is
//! issued) cannot drive an endless refresh loop.

use crate::error::{AuthError, Result};
use crate::state::UserId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Attempts recorded for one user within the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttemptWindow {
    count: u32,
    window_start_ms: i64,
}

/// Fixed-size rolling window of refresh attempts per user.
///
/// A window opens at a user's first attempt and lasts `window`. Entries are
/// removed on a successful refresh, and lazily (or by [`purge_expired`])
/// once their window has elapsed.
///
/// [`purge_expired`]: RefreshAttemptLimiter::purge_expired
#[derive(Debug)]
pub struct RefreshAttemptLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<UserId, AttemptWindow>>,
}

impl RefreshAttemptLimiter {
    /// Create a limiter allowing `max_attempts` per `window`.
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn window_ms(&self) -> i64 {
        // Safe: windows are minutes, far below i64::MAX milliseconds
        self.window.as_millis() as i64
    }

    /// Record an attempt for `user_id` if the limit allows it.
    ///
    /// # Errors
    ///
    /// - `AuthError::RefreshLimitExceeded` if the user already used every
    ///   attempt in the current window
    /// - `AuthError::InternalError` if the lock is poisoned
    pub fn try_acquire(&self, user_id: &UserId, now_ms: i64) -> Result<u32> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))?;

        let window_ms = self.window_ms();
        let entry = attempts.entry(user_id.clone()).or_insert(AttemptWindow {
            count: 0,
            window_start_ms: now_ms,
        });

        if now_ms.saturating_sub(entry.window_start_ms) >= window_ms {
            *entry = AttemptWindow {
                count: 0,
                window_start_ms: now_ms,
            };
        }

        if entry.count >= self.max_attempts {
            let remaining_ms = (entry.window_start_ms + window_ms - now_ms).max(0);
            #[allow(clippy::cast_sign_loss)]
            let retry_after = Duration::from_millis(remaining_ms as u64);

            tracing::warn!(
                rate_limit_exceeded = true,
                user_id = %user_id,
                attempts = entry.count,
                max_attempts = self.max_attempts,
                retry_after_ms = remaining_ms,
                "Token refresh attempt limit reached"
            );

            return Err(AuthError::RefreshLimitExceeded { retry_after });
        }

        entry.count += 1;

        tracing::debug!(
            user_id = %user_id,
            attempt = entry.count,
            max_attempts = self.max_attempts,
            "Token refresh attempt recorded"
        );

        Ok(entry.count)
    }

    /// Forget a user's attempts (called after a successful refresh).
    pub fn reset(&self, user_id: &UserId) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.remove(user_id);
        }
    }

    /// Attempts recorded for `user_id` in its current window.
    #[must_use]
    pub fn attempts(&self, user_id: &UserId, now_ms: i64) -> u32 {
        let window_ms = self.window_ms();
        self.attempts
            .lock()
            .ok()
            .and_then(|attempts| attempts.get(user_id).copied())
            .filter(|w| now_ms.saturating_sub(w.window_start_ms) < window_ms)
            .map_or(0, |w| w.count)
    }

    /// Remove windows that have elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let window_ms = self.window_ms();
        let Ok(mut attempts) = self.attempts.lock() else {
            return 0;
        };
        let before = attempts.len();
        attempts.retain(|_, w| now_ms.saturating_sub(w.window_start_ms) < window_ms);
        before - attempts.len()
    }

    /// Forget every user's attempts.
    pub fn clear(&self) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.clear();
        }
    }
}
