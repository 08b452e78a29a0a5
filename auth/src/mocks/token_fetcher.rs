//! Mock identity-provider token fetcher.

use crate::error::{AuthError, Result};
use crate::providers::TokenFetcher;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted token fetcher.
///
/// Queued responses are returned first, in order; after that every call
/// returns the default response. Clones share state, so a test can keep a
/// handle while the coordinator owns another.
#[derive(Debug, Clone)]
pub struct MockTokenFetcher {
    queued: Arc<Mutex<VecDeque<Result<Option<String>>>>>,
    default: Arc<Mutex<Result<Option<String>>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<AtomicUsize>,
}

impl MockTokenFetcher {
    /// Fetcher that always returns `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_default(Ok(Some(token.into())))
    }

    /// Fetcher whose identity provider has no session.
    #[must_use]
    pub fn no_session() -> Self {
        Self::with_default(Ok(None))
    }

    /// Fetcher that always fails with `error`.
    #[must_use]
    pub fn failing(error: AuthError) -> Self {
        Self::with_default(Err(error))
    }

    fn with_default(default: Result<Option<String>>) -> Self {
        Self {
            queued: Arc::new(Mutex::new(VecDeque::new())),
            default: Arc::new(Mutex::new(default)),
            delay: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every fetch by `delay` (uses tokio time, so paused clocks apply).
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        if let Ok(mut slot) = self.delay.lock() {
            *slot = Some(delay);
        }
        self
    }

    /// Change the default token.
    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut default) = self.default.lock() {
            *default = Ok(Some(token.into()));
        }
    }

    /// Queue a one-off error ahead of the default response.
    pub fn push_error(&self, error: AuthError) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(Err(error));
        }
    }

    /// Queue a one-off token ahead of the default response.
    pub fn push_token(&self, token: impl Into<String>) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(Ok(Some(token.into())));
        }
    }

    /// Number of times `fetch_token` has been called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<Option<String>> {
        let queued = self
            .queued
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))?
            .pop_front();

        match queued {
            Some(response) => response,
            None => self
                .default
                .lock()
                .map_err(|_| AuthError::InternalError("Mutex lock failed".into()))?
                .clone(),
        }
    }
}

impl TokenFetcher for MockTokenFetcher {
    async fn fetch_token(&self) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.next_response();
        tracing::debug!(ok = response.is_ok(), "Mock token fetch");
        response
    }
}
