//! GraphQL error classification.
//!
//! Hasura reports both expired credentials and row-level permission
//! failures as ordinary GraphQL errors on an HTTP 200 response. Callers
//! recover from the two very differently, so errors are sorted by their
//! `extensions.code` and, failing that, by message wording.

use crate::types::GraphQlErrorEntry;
use serde::{Deserialize, Serialize};

const AUTH_CODES: &[&str] = &["invalid-jwt", "jwt-invalid-claims", "invalid-headers"];

const AUTH_MESSAGE_HINTS: &[&str] = &["jwt", "unauthorized", "authentication", "token"];

const PERMISSION_MESSAGE_HINTS: &[&str] = &["permission denied", "not allowed"];

/// Broad category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials are missing, expired or rejected.
    Authentication,
    /// The role may not read or write the requested data.
    Permission,
    /// The endpoint could not be reached or is unavailable.
    Network,
    /// Anything else (validation, constraint violations, bugs).
    Other,
}

/// What a caller should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// Refresh the bearer token and retry once.
    RefreshToken,
    /// Fall back to reduced data and tell the user why.
    Degrade,
    /// Surface the error with a manual retry action.
    RetryManually,
}

impl ErrorKind {
    /// Stable lowercase name, used as a metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Permission => "permission",
            Self::Network => "network",
            Self::Other => "other",
        }
    }

    /// Recovery path for this kind of failure.
    #[must_use]
    pub const fn recovery(self) -> Recovery {
        match self {
            Self::Authentication => Recovery::RefreshToken,
            Self::Permission => Recovery::Degrade,
            Self::Network | Self::Other => Recovery::RetryManually,
        }
    }
}

/// Returns `true` if `error` means the bearer token was rejected.
#[must_use]
pub fn is_auth_error(error: &GraphQlErrorEntry) -> bool {
    let message = error.message.to_lowercase();

    match error.code() {
        Some(code) if AUTH_CODES.contains(&code) => true,
        Some("access-denied") => message.contains("jwt"),
        _ => AUTH_MESSAGE_HINTS.iter().any(|hint| message.contains(hint)),
    }
}

/// Returns `true` if `error` means the role lacks access to the data.
///
/// Hasura hides tables and columns a role cannot select, so a query that
/// touches them fails validation with "not found in type".
#[must_use]
pub fn is_permission_error(error: &GraphQlErrorEntry) -> bool {
    let message = error.message.to_lowercase();

    match error.code() {
        Some("permission-error") => true,
        Some("validation-failed") if message.contains("not found in type") => true,
        _ => PERMISSION_MESSAGE_HINTS.iter().any(|hint| message.contains(hint)),
    }
}

/// Classify a response's errors. Authentication wins over permission.
///
/// An empty slice is [`ErrorKind::Other`].
#[must_use]
pub fn classify(errors: &[GraphQlErrorEntry]) -> ErrorKind {
    if errors.iter().any(is_auth_error) {
        ErrorKind::Authentication
    } else if errors.iter().any(is_permission_error) {
        ErrorKind::Permission
    } else {
        ErrorKind::Other
    }
}
