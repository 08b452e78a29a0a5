//! Hasura GraphQL client implementation

use crate::{
    classify::classify,
    config::HasuraConfig,
    error::{GraphQlError, Result},
    types::{GraphQlRequest, GraphQlResponse},
};
use paybridge_auth::{RefreshCoordinator, TokenCipher, TokenFetcher, UserId};
use paybridge_runtime::metrics::GraphQlMetrics;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Header carrying the Hasura admin secret.
pub const ADMIN_SECRET_HEADER: &str = "x-hasura-admin-secret";

/// Credentials attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Authorization: Bearer <token>` with an identity-provider token.
    Bearer(String),
    /// `x-hasura-admin-secret` for privileged server-side calls.
    AdminSecret(String),
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(token) => f
                .debug_tuple("Bearer")
                .field(&paybridge_runtime::mask_token(token))
                .finish(),
            Self::AdminSecret(_) => f.write_str("AdminSecret([REDACTED])"),
        }
    }
}

/// Hasura GraphQL client
#[derive(Clone)]
pub struct HasuraClient {
    client: Client,
    config: HasuraConfig,
}

impl HasuraClient {
    /// Create a client from environment configuration
    ///
    /// # Errors
    ///
    /// Returns `GraphQlError::MissingEnv` if the endpoint URL is not set
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(HasuraConfig::from_env()?))
    }

    /// Create a client with explicit configuration
    #[must_use]
    pub fn new(config: HasuraConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// The active configuration
    #[must_use]
    pub const fn config(&self) -> &HasuraConfig {
        &self.config
    }

    /// Admin-secret credentials from the configuration
    ///
    /// # Errors
    ///
    /// Returns `GraphQlError::MissingEnv` if no admin secret is configured
    pub fn admin(&self) -> Result<Authorization> {
        self.config
            .admin_secret
            .clone()
            .map(Authorization::AdminSecret)
            .ok_or(GraphQlError::MissingEnv(crate::config::ADMIN_SECRET_ENV))
    }

    /// Execute a query or mutation and return its `data`
    ///
    /// # Errors
    ///
    /// - `GraphQlError::RequestFailed` for network failures
    /// - `GraphQlError::Unauthorized` / `HttpStatus` for non-success statuses
    /// - `GraphQlError::GraphQl` if the response carries errors
    /// - `GraphQlError::ResponseParseFailed` / `NoData` for malformed bodies
    pub async fn execute<T>(&self, request: &GraphQlRequest, auth: &Authorization) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let operation = request.operation_label();
        let started = Instant::now();

        let result = self.send(request, auth).await;
        GraphQlMetrics::record_request(operation, started.elapsed());

        if let Err(e) = &result {
            let kind = e.kind();
            GraphQlMetrics::record_error(kind.as_str());
            tracing::warn!(
                operation,
                kind = kind.as_str(),
                error = %e,
                "GraphQL request failed"
            );
        }

        result
    }

    async fn send<T>(&self, request: &GraphQlRequest, auth: &Authorization) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let builder = self.client.post(&self.config.graphql_url).json(request);
        let builder = match auth {
            Authorization::Bearer(token) => builder.bearer_auth(token),
            Authorization::AdminSecret(secret) => builder.header(ADMIN_SECRET_HEADER, secret),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| GraphQlError::RequestFailed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(GraphQlError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(GraphQlError::HttpStatus {
                    status: status.as_u16(),
                    message: body,
                });
            }
        }

        let body = response
            .json::<GraphQlResponse<T>>()
            .await
            .map_err(|e| GraphQlError::ResponseParseFailed(e.to_string()))?;

        if !body.errors.is_empty() {
            return Err(GraphQlError::GraphQl {
                kind: classify(&body.errors),
                errors: body.errors,
            });
        }

        body.data.ok_or(GraphQlError::NoData)
    }

    /// Execute on behalf of a signed-in user
    ///
    /// The bearer token comes from `coordinator`. If Hasura rejects it, the
    /// token is force-refreshed and the request retried once.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// `GraphQlError::Auth` when no token can be obtained
    pub async fn execute_as_user<T, C, F>(
        &self,
        coordinator: &RefreshCoordinator<C>,
        fetcher: &Arc<F>,
        user_id: &UserId,
        request: &GraphQlRequest,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        C: TokenCipher + 'static,
        F: TokenFetcher + 'static,
    {
        let token = coordinator.get_token(fetcher, user_id).await?;

        match self.execute(request, &Authorization::Bearer(token)).await {
            Err(e) if e.is_auth_error() => {
                tracing::info!(
                    user_id = %user_id,
                    operation = request.operation_label(),
                    "Token rejected, refreshing and retrying once"
                );
                let token = coordinator.force_refresh(fetcher, user_id).await?;
                self.execute(request, &Authorization::Bearer(token)).await
            }
            other => other,
        }
    }
}
