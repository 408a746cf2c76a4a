use crate::config::ServerConfig;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use harmonist_api::{AppStorage, QuoteClient};
use harmonist_shared::oauth::{IdentityProvider, OAuthFlow};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use std::{sync::Arc, time::Instant};

#[derive(Clone)]
pub struct AppState {
    /// Contribution ledger, counter and browser sessions
    pub storage: Arc<dyn AppStorage>,
    pub quotes: QuoteClient,
    pub provider: Arc<dyn IdentityProvider>,
    pub oauth: Arc<OAuthFlow>,
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        storage: Arc<dyn AppStorage>,
        quotes: QuoteClient,
        provider: Arc<dyn IdentityProvider>,
        http_client: reqwest::Client,
    ) -> Self {
        let oauth = OAuthFlow::new(provider.oauth_config(&config.callback_url()), http_client);
        let cookie_key = derive_cookie_key(&config.session_secret);

        Self {
            storage,
            quotes,
            provider,
            oauth: Arc::new(oauth),
            config: Arc::new(config),
            started_at: Instant::now(),
            cookie_key,
        }
    }

    pub fn cookie_key(&self) -> &Key {
        &self.cookie_key
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Stretch the configured secret to the 64 bytes the cookie key needs
pub fn derive_cookie_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}
