//! Google OAuth provider implementation

use crate::models::Identity;
use crate::oauth::config::OAuthConfig;
use crate::oauth::error::{OAuthError, OAuthResult};
use crate::oauth::flow::TokenResponse;
use crate::oauth::provider::IdentityProvider;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

/// Endpoints used by [`GoogleProvider`]; overridable for tests
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GoogleProvider::AUTH_URL.to_string(),
            token_url: GoogleProvider::TOKEN_URL.to_string(),
            userinfo_url: GoogleProvider::USERINFO_URL.to_string(),
        }
    }
}

/// Google sign-in
pub struct GoogleProvider {
    client_id: String,
    client_secret: SecretString,
    endpoints: GoogleEndpoints,
}

/// OpenID Connect userinfo payload
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl GoogleProvider {
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";

    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    const USERINFO_URL: &'static str = "https://openidconnect.googleapis.com/v1/userinfo";

    const SCOPES: &'static [&'static str] = &["openid", "profile", "email"];

    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            endpoints: GoogleEndpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn identity_from_userinfo(info: GoogleUserInfo) -> OAuthResult<Identity> {
        if info.sub.trim().is_empty() {
            return Err(OAuthError::profile_fetch_failed(
                "profile is missing the subject id",
            ));
        }

        let email = info.email.unwrap_or_default();
        let display_name = [info.name.as_deref(), info.given_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if email.is_empty() {
                    info.sub.clone()
                } else {
                    email.clone()
                }
            });

        let identity = Identity::new(info.sub, display_name, email);
        Ok(match info.picture.filter(|url| !url.is_empty()) {
            Some(picture) => identity.with_photo_url(picture),
            None => identity,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn id(&self) -> &'static str {
        "google"
    }

    fn oauth_config(&self, redirect_url: &str) -> OAuthConfig {
        OAuthConfig::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.endpoints.auth_url.clone(),
            self.endpoints.token_url.clone(),
            redirect_url,
            Self::SCOPES.iter().map(|s| s.to_string()).collect(),
        )
    }

    async fn fetch_identity(
        &self,
        client: &reqwest::Client,
        tokens: &TokenResponse,
    ) -> OAuthResult<Identity> {
        let response = client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Google userinfo request failed: {} - {}", status, error_text);
            return Err(OAuthError::profile_fetch_failed(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        let info: GoogleUserInfo = serde_json::from_str(&body)?;
        Self::identity_from_userinfo(info)
    }
}
