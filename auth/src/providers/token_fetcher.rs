//! Identity-provider token fetching.

use crate::error::Result;
use std::future::Future;

/// Source of fresh session tokens for one user.
///
/// The refresh coordinator never talks to the identity provider itself; the
/// caller hands it a fetcher bound to the user's session.
///
/// # Returns
///
/// - `Ok(Some(token))` - a freshly minted token
/// - `Ok(None)` - the provider has no session for this user
///
/// # Example
///
/// ```
/// use paybridge_auth::providers::{TokenFetcher, fetcher_fn};
///
/// # async fn example() -> paybridge_auth::Result<()> {
/// let fetcher = fetcher_fn(|| async { Ok(Some("eyJ...".to_string())) });
/// assert_eq!(fetcher.fetch_token().await?, Some("eyJ...".to_string()));
/// # Ok(())
/// # }
/// ```
pub trait TokenFetcher: Send + Sync {
    /// Fetch a new token from the identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    fn fetch_token(&self) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Adapter turning an async closure into a [`TokenFetcher`].
#[derive(Debug, Clone)]
pub struct FnFetcher<F> {
    fetch: F,
}

/// Wrap an async closure as a [`TokenFetcher`].
pub const fn fetcher_fn<F, Fut>(fetch: F) -> FnFetcher<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send,
{
    FnFetcher { fetch }
}

impl<F, Fut> TokenFetcher for FnFetcher<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send,
{
    fn fetch_token(&self) -> impl Future<Output = Result<Option<String>>> + Send {
        (self.fetch)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_fn_fetcher_propagates_errors() {
        let fetcher = fetcher_fn(|| async { Err(AuthError::TokenFetchFailed("offline".into())) });
        assert_eq!(
            fetcher.fetch_token().await,
            Err(AuthError::TokenFetchFailed("offline".into()))
        );
    }

    #[test]
    fn test_fn_fetcher_no_session() {
        let fetcher = fetcher_fn(|| async { Ok(None) });
        let token = tokio_test::assert_ok!(tokio_test::block_on(fetcher.fetch_token()));
        assert_eq!(token, None);
    }
}
