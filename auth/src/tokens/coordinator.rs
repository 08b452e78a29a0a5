//! Token refresh coordination.
//!
//! # Concurrency
//!
//! - Refreshes for the same user are coalesced: the first caller spawns the
//!   refresh and publishes a shared future; later callers await that same
//!   future. At most one refresh per user is ever in flight.
//! - Once `max_concurrent_refreshes` are in flight across all users, callers
//!   for other users sleep `saturation_backoff` and retry through the normal
//!   cache path instead of queueing.
//! - A refresh runs on its own task and always completes, even if every
//!   caller stops awaiting it.
//!
//! Locks are plain `std::sync::Mutex`es held only for map reads and writes,
//! never across an `.await`.

use super::expiry::token_expiry_millis;
use super::limiter::RefreshAttemptLimiter;
use super::{RefreshMetrics, TokenData, TokenPayload};
use crate::config::TokenCacheConfig;
use crate::crypto::{AesGcmTokenCipher, TokenCipher};
use crate::error::{AuthError, Result};
use crate::providers::TokenFetcher;
use crate::state::UserId;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use paybridge_core::environment::{Clock, SystemClock};
use paybridge_runtime::metrics::TokenMetrics;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

type SharedRefresh = Shared<BoxFuture<'static, Result<String>>>;

/// Outcome of trying to start or join a refresh.
enum RefreshSlot {
    /// A refresh for the user is running; await it.
    Running(SharedRefresh),
    /// The global ceiling is reached; back off and retry.
    Saturated,
}

/// Removes a user's in-flight entry when dropped, including when the fetch
/// panics and the refresh task unwinds.
struct InFlightRegistration<'a> {
    in_flight: &'a Mutex<HashMap<UserId, SharedRefresh>>,
    user_id: &'a UserId,
}

impl Drop for InFlightRegistration<'_> {
    fn drop(&mut self) {
        // A poisoned map is still cleared so the user is never wedged.
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        in_flight.remove(self.user_id);
    }
}

struct Inner<C> {
    config: TokenCacheConfig,
    clock: Arc<dyn Clock>,
    cipher: C,
    cache: Mutex<HashMap<UserId, TokenData>>,
    in_flight: Mutex<HashMap<UserId, SharedRefresh>>,
    limiter: RefreshAttemptLimiter,
    metrics: Mutex<RefreshMetrics>,
}

/// Per-user token cache with coalesced, rate-limited refreshes.
///
/// Cheap to clone; clones share the same cache.
///
/// # Example
///
/// ```
/// use paybridge_auth::providers::fetcher_fn;
/// use paybridge_auth::state::UserId;
/// use paybridge_auth::tokens::RefreshCoordinator;
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> paybridge_auth::Result<()> {
/// let coordinator = RefreshCoordinator::with_defaults();
/// let fetcher = Arc::new(fetcher_fn(|| async { Ok(Some("opaque-session-token".to_string())) }));
/// let user = UserId::new("user_2abc");
///
/// let token = coordinator.get_token(&fetcher, &user).await?;
/// assert_eq!(token, "opaque-session-token");
///
/// // Served from cache this time.
/// let again = coordinator.get_token(&fetcher, &user).await?;
/// assert_eq!(again, token);
/// assert_eq!(coordinator.metrics().total_refreshes, 1);
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator<C = AesGcmTokenCipher> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for RefreshCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl RefreshCoordinator<AesGcmTokenCipher> {
    /// Default policy, a per-process AES-256-GCM key and the system clock.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            TokenCacheConfig::default(),
            AesGcmTokenCipher::generate(),
            Arc::new(SystemClock),
        )
    }
}

impl<C: TokenCipher + 'static> RefreshCoordinator<C> {
    /// Create a coordinator.
    #[must_use]
    pub fn new(config: TokenCacheConfig, cipher: C, clock: Arc<dyn Clock>) -> Self {
        let limiter = RefreshAttemptLimiter::new(config.max_refresh_attempts, config.attempt_window);
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                cipher,
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                limiter,
                metrics: Mutex::new(RefreshMetrics::default()),
            }),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TokenCacheConfig {
        &self.inner.config
    }

    /// Return a valid token for `user_id`, refreshing through `fetcher` if needed.
    ///
    /// # Errors
    ///
    /// - `AuthError::RefreshLimitExceeded` if the user exhausted their refresh
    ///   attempts for the current window (the fetcher is not called)
    /// - `AuthError::NoSession` if the identity provider has no session
    /// - Any error returned by `fetcher`
    pub async fn get_token<F>(&self, fetcher: &Arc<F>, user_id: &UserId) -> Result<String>
    where
        F: TokenFetcher + 'static,
    {
        self.acquire(fetcher, user_id, true).await
    }

    /// Discard the cached token and fetch a new one.
    ///
    /// Joins a refresh that is already in flight for the user rather than
    /// starting a second one.
    ///
    /// # Errors
    ///
    /// Same as [`get_token`](Self::get_token).
    pub async fn force_refresh<F>(&self, fetcher: &Arc<F>, user_id: &UserId) -> Result<String>
    where
        F: TokenFetcher + 'static,
    {
        self.inner.evict(user_id)?;
        tracing::info!(user_id = %user_id, "Forcing token refresh");
        self.acquire(fetcher, user_id, false).await
    }

    async fn acquire<F>(&self, fetcher: &Arc<F>, user_id: &UserId, mut use_cache: bool) -> Result<String>
    where
        F: TokenFetcher + 'static,
    {
        loop {
            if use_cache {
                if let Some(token) = self.inner.cached_token(user_id)? {
                    TokenMetrics::record_cache_hit();
                    return Ok(token);
                }
            }

            match Inner::begin_refresh(&self.inner, fetcher, user_id)? {
                RefreshSlot::Running(refresh) => return refresh.await,
                RefreshSlot::Saturated => {
                    tracing::debug!(
                        user_id = %user_id,
                        backoff_ms = u64::try_from(self.inner.config.saturation_backoff.as_millis()).unwrap_or(u64::MAX),
                        "Refresh ceiling reached, backing off"
                    );
                    tokio::time::sleep(self.inner.config.saturation_backoff).await;
                    use_cache = true;
                }
            }
        }
    }

    /// Invalidate one user's cached token (sign-out).
    ///
    /// Also forgets the user's refresh attempts. A refresh already in flight
    /// is not cancelled. Returns `true` if a token was cached.
    pub fn clear_user_token(&self, user_id: &UserId) -> bool {
        let removed = self.inner.evict(user_id).unwrap_or(false);
        self.inner.limiter.reset(user_id);

        tracing::info!(user_id = %user_id, removed, "Cleared cached token");
        removed
    }

    /// Invalidate every cached token.
    pub fn clear_all_tokens(&self) {
        let count = self
            .inner
            .lock_cache()
            .map(|mut cache| {
                let count = cache.len();
                cache.clear();
                count
            })
            .unwrap_or(0);
        self.inner.limiter.clear();
        TokenMetrics::record_cache_size(0);

        tracing::info!(count, "Cleared all cached tokens");
    }

    /// Remove cache entries whose expiry has passed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.inner.sweep_expired()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `sweep_interval`.
    ///
    /// The task ends on its own once every coordinator clone is dropped.
    pub fn spawn_expiry_sweep(&self) -> JoinHandle<()> {
        let weak: Weak<Inner<C>> = Arc::downgrade(&self.inner);
        let period = self.inner.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    tracing::debug!("Token cache dropped, stopping expiry sweep");
                    break;
                };
                inner.sweep_expired();
            }
        })
    }

    /// Snapshot of the refresh statistics.
    #[must_use]
    pub fn metrics(&self) -> RefreshMetrics {
        self.inner
            .metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// The cache entry for `user_id`, valid or not.
    #[must_use]
    pub fn cached_entry(&self, user_id: &UserId) -> Option<TokenData> {
        self.inner
            .lock_cache()
            .ok()
            .and_then(|cache| cache.get(user_id).cloned())
    }

    /// Number of users with a cached token.
    #[must_use]
    pub fn cached_user_count(&self) -> usize {
        self.inner.lock_cache().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Number of refreshes currently running.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if a refresh for `user_id` is running.
    #[must_use]
    pub fn is_refreshing(&self, user_id: &UserId) -> bool {
        self.inner
            .in_flight
            .lock()
            .map(|m| m.contains_key(user_id))
            .unwrap_or(false)
    }

    /// Refresh attempts `user_id` has used in the current window.
    #[must_use]
    pub fn refresh_attempts(&self, user_id: &UserId) -> u32 {
        self.inner
            .limiter
            .attempts(user_id, self.inner.clock.now_millis())
    }
}

impl<C: TokenCipher + 'static> Inner<C> {
    fn lock_cache(&self) -> Result<MutexGuard<'_, HashMap<UserId, TokenData>>> {
        self.cache
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))
    }

    fn evict(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.lock_cache()?.remove(user_id).is_some())
    }

    /// Cached token if it outlives the expiry buffer.
    ///
    /// An entry that fails to decrypt is dropped and reported as a miss.
    fn cached_token(&self, user_id: &UserId) -> Result<Option<String>> {
        let now_ms = self.clock.now_millis();
        let mut cache = self.lock_cache()?;

        let Some(entry) = cache.get(user_id) else {
            return Ok(None);
        };

        if !entry.is_valid(now_ms, self.config.expiry_buffer) {
            tracing::debug!(
                user_id = %user_id,
                expires_in_ms = entry.expires_at_ms.saturating_sub(now_ms),
                "Cached token inside expiry buffer"
            );
            return Ok(None);
        }

        let decrypted = match &entry.payload {
            TokenPayload::Plaintext(token) => Ok(token.clone()),
            TokenPayload::Encrypted(encrypted) => self.cipher.decrypt(encrypted),
        };

        match decrypted {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    security = true,
                    user_id = %user_id,
                    error = %e,
                    "Cached token failed to decrypt, invalidating"
                );
                cache.remove(user_id);
                Ok(None)
            }
        }
    }

    fn begin_refresh<F>(this: &Arc<Self>, fetcher: &Arc<F>, user_id: &UserId) -> Result<RefreshSlot>
    where
        F: TokenFetcher + 'static,
    {
        let mut in_flight = this
            .in_flight
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))?;

        if let Some(running) = in_flight.get(user_id) {
            tracing::debug!(user_id = %user_id, "Joining in-flight token refresh");
            return Ok(RefreshSlot::Running(running.clone()));
        }

        if in_flight.len() >= this.config.max_concurrent_refreshes {
            tracing::warn!(
                user_id = %user_id,
                in_flight = in_flight.len(),
                max_concurrent = this.config.max_concurrent_refreshes,
                "Too many concurrent token refreshes"
            );
            return Ok(RefreshSlot::Saturated);
        }

        if let Err(e) = this.limiter.try_acquire(user_id, this.clock.now_millis()) {
            TokenMetrics::record_rate_limited();
            return Err(e);
        }

        let inner = Arc::clone(this);
        let fetcher = Arc::clone(fetcher);
        let owner = user_id.clone();
        // The in_flight lock is still held, so the task cannot deregister
        // itself before the entry below is inserted.
        let task = tokio::spawn(async move { inner.run_refresh(fetcher.as_ref(), owner).await });

        let refresh = async move {
            task.await
                .unwrap_or_else(|e| Err(AuthError::InternalError(format!("Refresh task failed: {e}"))))
        }
        .boxed()
        .shared();

        in_flight.insert(user_id.clone(), refresh.clone());
        Ok(RefreshSlot::Running(refresh))
    }

    async fn run_refresh<F: TokenFetcher>(&self, fetcher: &F, user_id: UserId) -> Result<String> {
        let registration = InFlightRegistration {
            in_flight: &self.in_flight,
            user_id: &user_id,
        };
        let started = Instant::now();
        TokenMetrics::record_attempt();
        tracing::info!(user_id = %user_id, "Refreshing token");

        let outcome = match fetcher.fetch_token().await {
            Ok(Some(token)) => self.store(&user_id, &token).map(|()| token),
            Ok(None) => Err(AuthError::NoSession),
            Err(e) => Err(e),
        };

        let elapsed = started.elapsed();
        let success = outcome.is_ok();

        match &outcome {
            Ok(token) => {
                self.limiter.reset(&user_id);
                TokenMetrics::record_success(elapsed);
                tracing::info!(
                    user_id = %user_id,
                    token = %paybridge_runtime::mask_token(token),
                    duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Token refreshed"
                );
            }
            Err(e) => {
                TokenMetrics::record_failure(elapsed);
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Token refresh failed"
                );
            }
        }

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record(success, self.clock.now(), elapsed);
        }

        // Deregister only after the cache write: callers find either the
        // running refresh or its cached result.
        drop(registration);

        outcome
    }

    /// Encrypt and cache a freshly fetched token, replacing any previous entry.
    fn store(&self, user_id: &UserId, token: &str) -> Result<()> {
        let now_ms = self.clock.now_millis();
        let expires_at_ms = token_expiry_millis(token, now_ms, self.config.default_token_lifetime);

        let (payload, encrypted) = match self.cipher.encrypt(token) {
            Ok(ciphertext) => (TokenPayload::Encrypted(ciphertext), true),
            Err(e) => {
                tracing::warn!(
                    security = true,
                    user_id = %user_id,
                    error = %e,
                    "Token encryption failed, caching plaintext"
                );
                TokenMetrics::record_encryption_fallback();
                (TokenPayload::Plaintext(token.to_string()), false)
            }
        };

        let mut cache = self.lock_cache()?;
        cache.insert(
            user_id.clone(),
            TokenData {
                payload,
                expires_at_ms,
                user_id: user_id.clone(),
                encrypted,
            },
        );
        TokenMetrics::record_cache_size(cache.len());
        Ok(())
    }

    fn sweep_expired(&self) -> usize {
        let now_ms = self.clock.now_millis();
        let Ok(mut cache) = self.lock_cache() else {
            return 0;
        };

        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now_ms));
        let removed = before - cache.len();
        let remaining = cache.len();
        drop(cache);

        let stale_windows = self.limiter.purge_expired(now_ms);

        TokenMetrics::record_swept(removed);
        TokenMetrics::record_cache_size(remaining);

        if removed > 0 || stale_windows > 0 {
            tracing::info!(removed, remaining, stale_windows, "Swept expired token cache entries");
        }

        removed
    }
}
