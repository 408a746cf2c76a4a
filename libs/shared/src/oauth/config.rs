//! OAuth configuration types

use secrecy::SecretString;

/// Configuration for an OAuth 2.0 confidential client
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret, sent only to the token endpoint
    pub client_secret: SecretString,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token exchange endpoint URL
    pub token_url: String,
    /// Redirect URI registered with the provider
    pub redirect_url: String,
    /// Scopes to request
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            redirect_url: redirect_url.into(),
            scopes,
        }
    }

    /// Get the scopes as a space-separated string
    pub fn scopes_string(&self) -> String {
        self.scopes.join(" ")
    }
}
