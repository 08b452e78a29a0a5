//! Error types for authentication, authorization and token caching.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the auth context and the token refresh coordinator.
///
/// Errors are `Clone` because a single refresh outcome is shared by every
/// caller coalesced onto the same in-flight refresh.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// No signed-in, active user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// User lacks required permissions.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Required permission or role that was missing
        required: String,
    },

    /// Role name not present in the role table.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    // ═══════════════════════════════════════════════════════════
    // Token Errors
    // ═══════════════════════════════════════════════════════════

    /// The identity provider has no session for this user.
    #[error("No active identity provider session")]
    NoSession,

    /// Too many refresh attempts for this user inside the attempt window.
    #[error("Token refresh limit exceeded, retry after {retry_after:?}")]
    RefreshLimitExceeded {
        /// Duration until the attempt window resets
        retry_after: std::time::Duration,
    },

    /// The caller-supplied fetch function failed.
    #[error("Token fetch failed: {0}")]
    TokenFetchFailed(String),

    /// A token could not be encrypted for caching.
    #[error("Token encryption failed: {0}")]
    EncryptionFailed(String),

    /// A cached token could not be decrypted.
    #[error("Token decryption failed: {0}")]
    DecryptionFailed(String),

    /// Encryption key material was rejected.
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is due to the caller's own access level.
    ///
    /// # Examples
    ///
    /// ```
    /// # use paybridge_auth::AuthError;
    /// assert!(AuthError::NotAuthenticated.is_user_error());
    /// assert!(!AuthError::InternalError("boom".into()).is_user_error());
    /// ```
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::InsufficientPermissions { .. }
        )
    }

    /// Returns `true` if the session cannot be recovered and the user must
    /// go through the sign-out flow.
    ///
    /// # Examples
    ///
    /// ```
    /// # use paybridge_auth::AuthError;
    /// # use std::time::Duration;
    /// assert!(AuthError::NoSession.requires_sign_out());
    /// assert!(AuthError::RefreshLimitExceeded { retry_after: Duration::from_secs(60) }.requires_sign_out());
    /// assert!(!AuthError::TokenFetchFailed("timeout".into()).requires_sign_out());
    /// ```
    pub const fn requires_sign_out(&self) -> bool {
        matches!(self, Self::NoSession | Self::RefreshLimitExceeded { .. })
    }

    /// Returns `true` if this error indicates a security issue.
    pub const fn is_security_issue(&self) -> bool {
        matches!(
            self,
            Self::DecryptionFailed(_) | Self::RefreshLimitExceeded { .. }
        )
    }
}
