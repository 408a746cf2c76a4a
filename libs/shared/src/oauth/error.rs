//! OAuth error types

use thiserror::Error;

/// Errors that can occur during OAuth sign-in
#[derive(Error, Debug)]
pub enum OAuthError {
    /// The provider redirected back with an `error` parameter
    #[error("Authorization denied by provider: {0}")]
    AuthorizationDenied(String),

    /// The callback was missing `code` or `state`, or no login was pending
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// `state` did not match the value issued with the authorization URL
    #[error("State mismatch - possible CSRF attack")]
    StateMismatch,

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Fetching the user profile failed
    #[error("Profile request failed: {0}")]
    ProfileFetchFailed(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OAuthError {
    pub fn invalid_callback(msg: impl Into<String>) -> Self {
        Self::InvalidCallback(msg.into())
    }

    pub fn token_exchange_failed(msg: impl Into<String>) -> Self {
        Self::TokenExchangeFailed(msg.into())
    }

    pub fn profile_fetch_failed(msg: impl Into<String>) -> Self {
        Self::ProfileFetchFailed(msg.into())
    }
}

/// Result type alias for OAuth operations
pub type OAuthResult<T> = Result<T, OAuthError>;
