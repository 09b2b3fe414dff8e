//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while verifying a provider token and signing in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the access token (expired, revoked or forged).
    #[error("invalid access token")]
    InvalidToken,

    /// The provider user has no email address.
    #[error("provider user has no email")]
    MissingEmail,

    /// The provider user's email is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] sammys_market_core::EmailError),

    /// The provider answered with an unexpected status.
    #[error("auth provider error: {0}")]
    Provider(String),

    /// HTTP request to the provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::InvalidToken.to_string(), "invalid access token");
        assert_eq!(
            AuthError::Provider("500: down".to_string()).to_string(),
            "auth provider error: 500: down"
        );
    }
}
