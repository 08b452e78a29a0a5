//! Hasura endpoint configuration.

use crate::error::{GraphQlError, Result};
use std::fmt;

/// Environment variable holding the GraphQL endpoint URL.
pub const GRAPHQL_URL_ENV: &str = "NEXT_PUBLIC_HASURA_GRAPHQL_URL";

/// Environment variable holding the admin secret.
pub const ADMIN_SECRET_ENV: &str = "HASURA_GRAPHQL_ADMIN_SECRET";

/// Environment variable holding the public app URL.
pub const APP_URL_ENV: &str = "NEXT_PUBLIC_APP_URL";

/// Hasura connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct HasuraConfig {
    /// GraphQL endpoint, e.g. `https://hasura.example.com/v1/graphql`.
    pub graphql_url: String,

    /// Admin secret for privileged server-side calls.
    pub admin_secret: Option<String>,

    /// Public URL of the admin app.
    pub app_url: Option<String>,
}

impl HasuraConfig {
    /// Config for `graphql_url` with no admin secret.
    #[must_use]
    pub fn new(graphql_url: impl Into<String>) -> Self {
        Self {
            graphql_url: graphql_url.into(),
            admin_secret: None,
            app_url: None,
        }
    }

    /// Set the admin secret.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: impl Into<String>) -> Self {
        self.admin_secret = Some(secret.into());
        self
    }

    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `GraphQlError::MissingEnv` if `NEXT_PUBLIC_HASURA_GRAPHQL_URL`
    /// is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `GraphQlError::MissingEnv` if the endpoint URL is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let graphql_url = get(GRAPHQL_URL_ENV).ok_or(GraphQlError::MissingEnv(GRAPHQL_URL_ENV))?;
        let config = Self {
            graphql_url,
            admin_secret: get(ADMIN_SECRET_ENV),
            app_url: get(APP_URL_ENV),
        };

        tracing::debug!(
            graphql_url = %config.graphql_url,
            has_admin_secret = config.admin_secret.is_some(),
            "Hasura config loaded"
        );

        Ok(config)
    }
}

impl fmt::Debug for HasuraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasuraConfig")
            .field("graphql_url", &self.graphql_url)
            .field(
                "admin_secret",
                &self.admin_secret.as_ref().map(|_| paybridge_runtime::logging::REDACTED),
            )
            .field("app_url", &self.app_url)
            .finish()
    }
}
