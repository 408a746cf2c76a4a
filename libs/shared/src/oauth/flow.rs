//! OAuth 2.0 authorization code flow implementation

use super::config::OAuthConfig;
use super::error::{OAuthError, OAuthResult};
use super::pkce::{PkceChallenge, generate_state};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// OAuth token response from the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for provider API requests
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// A started login: the URL to send the browser to, plus the values that
/// must be remembered until the callback arrives
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub pkce_verifier: String,
}

/// Authorization code flow for one OAuth client
///
/// The flow is stateless: each call to [`OAuthFlow::authorization_request`]
/// returns fresh `state` and PKCE values that the caller keeps (e.g. in an
/// encrypted cookie) and hands back to [`OAuthFlow::exchange_code`].
pub struct OAuthFlow {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(config: OAuthConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// HTTP client shared with provider profile lookups
    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Build the authorization URL with a new PKCE challenge and `state`
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let pkce = PkceChallenge::generate();
        let state = generate_state();

        let url = format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method={}&state={}&access_type=online&prompt=select_account",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&self.config.scopes_string()),
            urlencoding::encode(&pkce.challenge),
            PkceChallenge::challenge_method(),
            urlencoding::encode(&state),
        );

        AuthorizationRequest {
            url,
            state,
            pkce_verifier: pkce.verifier,
        }
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> OAuthResult<TokenResponse> {
        if code.trim().is_empty() {
            return Err(OAuthError::invalid_callback("authorization code is empty"));
        }

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("code_verifier", pkce_verifier),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OAuthError::token_exchange_failed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            OAuthError::token_exchange_failed(format!("Failed to parse token response: {}", e))
        })
    }
}

/// Check the `state` returned on the callback against the one we issued
pub fn verify_state(expected: &str, returned: &str) -> OAuthResult<()> {
    if expected.is_empty() || expected != returned {
        return Err(OAuthError::StateMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Form, Json, Router, http::StatusCode, routing::post};
    use secrecy::SecretString;
    use std::collections::HashMap;

    fn test_config(token_url: &str) -> OAuthConfig {
        OAuthConfig::new(
            "test-client-id",
            SecretString::from("test-secret"),
            "https://example.com/auth",
            token_url,
            "http://localhost:3001/auth/google/callback",
            vec!["openid".to_string(), "email".to_string()],
        )
    }

    async fn spawn_token_server(router: Router) -> String {
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(error) => panic!("failed to bind test listener: {error}"),
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(error) => panic!("failed to read local addr: {error}"),
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}/token")
    }

    #[test]
    fn test_authorization_request_url() {
        let flow = OAuthFlow::new(
            test_config("https://example.com/token"),
            reqwest::Client::new(),
        );
        let request = flow.authorization_request();

        assert!(request.url.starts_with("https://example.com/auth?"));
        assert!(request.url.contains("client_id=test-client-id"));
        assert!(request.url.contains("response_type=code"));
        assert!(
            request
                .url
                .contains("redirect_uri=http%3A%2F%2Flocalhost%3A3001%2Fauth%2Fgoogle%2Fcallback")
        );
        assert!(request.url.contains("scope=openid%20email"));
        assert!(request.url.contains("code_challenge_method=S256"));
        assert!(request.url.contains(&format!("state={}", request.state)));
        assert!(!request.url.contains(&request.pkce_verifier));
        assert!(!request.url.contains("test-secret"));
    }

    #[test]
    fn test_authorization_requests_are_fresh() {
        let flow = OAuthFlow::new(
            test_config("https://example.com/token"),
            reqwest::Client::new(),
        );
        let first = flow.authorization_request();
        let second = flow.authorization_request();

        assert_ne!(first.state, second.state);
        assert_ne!(first.pkce_verifier, second.pkce_verifier);
    }

    #[test]
    fn test_verify_state() {
        assert!(verify_state("abc", "abc").is_ok());
        assert!(matches!(
            verify_state("abc", "abd"),
            Err(OAuthError::StateMismatch)
        ));
        assert!(matches!(
            verify_state("", ""),
            Err(OAuthError::StateMismatch)
        ));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form_with_verifier() {
        let router = Router::new().route(
            "/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
                    && form.get("code").map(String::as_str) == Some("the-code")
                    && form.get("code_verifier").map(String::as_str) == Some("the-verifier")
                    && form.get("client_secret").map(String::as_str) == Some("test-secret");
                if !valid {
                    return Err(StatusCode::BAD_REQUEST);
                }
                Ok(Json(serde_json::json!({
                    "access_token": "access-123",
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "scope": "openid email"
                })))
            }),
        );
        let token_url = spawn_token_server(router).await;
        let flow = OAuthFlow::new(test_config(&token_url), reqwest::Client::new());

        let tokens = match flow.exchange_code("the-code", "the-verifier").await {
            Ok(tokens) => tokens,
            Err(error) => panic!("exchange should succeed: {error}"),
        };

        assert_eq!(tokens.access_token, "access-123");
        assert_eq!(tokens.expires_in, Some(3599));
        assert_eq!(tokens.refresh_token, None);
    }

    #[tokio::test]
    async fn test_exchange_code_reports_http_failure() {
        let router = Router::new().route(
            "/token",
            post(|| async { (StatusCode::BAD_REQUEST, "invalid_grant") }),
        );
        let token_url = spawn_token_server(router).await;
        let flow = OAuthFlow::new(test_config(&token_url), reqwest::Client::new());

        let result = flow.exchange_code("stale-code", "verifier").await;
        match result {
            Err(OAuthError::TokenExchangeFailed(message)) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("expected token exchange failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_rejects_empty_code() {
        let flow = OAuthFlow::new(
            test_config("http://127.0.0.1:9/token"),
            reqwest::Client::new(),
        );
        let result = flow.exchange_code("  ", "verifier").await;
        assert!(matches!(result, Err(OAuthError::InvalidCallback(_))));
    }
}
