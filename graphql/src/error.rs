//! Error types for the Hasura GraphQL client

use crate::classify::{ErrorKind, Recovery};
use crate::types::GraphQlErrorEntry;
use paybridge_auth::AuthError;
use thiserror::Error;

/// Errors that can occur when talking to Hasura
#[derive(Debug, Error)]
pub enum GraphQlError {
    /// A required environment variable is missing or empty
    #[error("Missing {0} environment variable")]
    MissingEnv(&'static str),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body was not a GraphQL response
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Endpoint rejected the credentials (HTTP 401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Endpoint returned a non-success HTTP status
    #[error("HTTP error (status {status}): {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Response carried GraphQL errors
    #[error("GraphQL {} error: {}", kind.as_str(), first_message(errors))]
    GraphQl {
        /// Classification of `errors`
        kind: ErrorKind,
        /// Errors as returned by the server
        errors: Vec<GraphQlErrorEntry>,
    },

    /// Response had neither data nor errors
    #[error("Response contained no data")]
    NoData,

    /// Bearer token could not be obtained
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

fn first_message(errors: &[GraphQlErrorEntry]) -> &str {
    errors.first().map_or("", |e| e.message.as_str())
}

impl GraphQlError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::Auth(_) => ErrorKind::Authentication,
            Self::HttpStatus { status: 403, .. } => ErrorKind::Permission,
            Self::RequestFailed(_) => ErrorKind::Network,
            Self::HttpStatus { status, .. } if *status >= 500 => ErrorKind::Network,
            Self::GraphQl { kind, .. } => *kind,
            Self::MissingEnv(_)
            | Self::ResponseParseFailed(_)
            | Self::HttpStatus { .. }
            | Self::NoData => ErrorKind::Other,
        }
    }

    /// How a caller should recover from this error.
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        self.kind().recovery()
    }

    /// Returns `true` if a fresh bearer token may fix the request.
    ///
    /// Token-cache failures are excluded: refreshing again cannot help them.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        !matches!(self, Self::Auth(_)) && self.kind() == ErrorKind::Authentication
    }
}

/// Result type for GraphQL operations
pub type Result<T> = std::result::Result<T, GraphQlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_kinds() {
        let forbidden = GraphQlError::HttpStatus {
            status: 403,
            message: String::new(),
        };
        let unavailable = GraphQlError::HttpStatus {
            status: 503,
            message: String::new(),
        };
        let bad_request = GraphQlError::HttpStatus {
            status: 400,
            message: String::new(),
        };

        assert_eq!(forbidden.kind(), ErrorKind::Permission);
        assert_eq!(unavailable.kind(), ErrorKind::Network);
        assert_eq!(bad_request.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_token_cache_errors_do_not_trigger_refresh() {
        let err = GraphQlError::from(AuthError::NoSession);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!err.is_auth_error());
        assert!(GraphQlError::Unauthorized.is_auth_error());
    }

    #[test]
    fn test_display_uses_first_message() {
        let err = GraphQlError::GraphQl {
            kind: ErrorKind::Permission,
            errors: vec![GraphQlErrorEntry::new("permission denied for table payrolls")],
        };
        assert_eq!(
            err.to_string(),
            "GraphQL permission error: permission denied for table payrolls"
        );
    }
}
