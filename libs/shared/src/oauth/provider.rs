//! Identity provider trait

use super::config::OAuthConfig;
use super::error::OAuthResult;
use super::flow::TokenResponse;
use crate::models::Identity;
use async_trait::async_trait;

/// An external OAuth provider that can authenticate a user and describe them
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider identifier used in routes (e.g., "google")
    fn id(&self) -> &'static str;

    /// OAuth client configuration for the given callback URL
    fn oauth_config(&self, redirect_url: &str) -> OAuthConfig;

    /// Resolve the signed-in user's profile from freshly exchanged tokens
    async fn fetch_identity(
        &self,
        client: &reqwest::Client,
        tokens: &TokenResponse,
    ) -> OAuthResult<Identity>;
}
