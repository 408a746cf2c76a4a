//! OAuth 2.0 sign-in support
//!
//! This module implements the authorization code flow (with PKCE and a
//! `state` parameter) used to sign users in through an external identity
//! provider, starting with Google.
//!
//! # Architecture
//!
//! - `config`: OAuth client configuration
//! - `error`: Error types for OAuth operations
//! - `flow`: Authorization URL construction and code exchange
//! - `pkce`: PKCE (Proof Key for Code Exchange) and `state` generation
//! - `provider`: Identity provider trait
//! - `providers`: Concrete provider implementations
//!
//! # Example
//!
//! ```rust,ignore
//! use harmonist_shared::oauth::{GoogleProvider, IdentityProvider, OAuthFlow};
//!
//! let provider = GoogleProvider::new(client_id, client_secret);
//! let flow = OAuthFlow::new(provider.oauth_config(&redirect_url), http_client);
//!
//! // Redirect the browser, remembering `state` and `pkce_verifier`
//! let request = flow.authorization_request();
//!
//! // Later, on the callback:
//! // let tokens = flow.exchange_code(&code, &request.pkce_verifier).await?;
//! // let identity = provider.fetch_identity(flow.http_client(), &tokens).await?;
//! ```

pub mod config;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod provider;
pub mod providers;

pub use config::OAuthConfig;
pub use error::{OAuthError, OAuthResult};
pub use flow::{AuthorizationRequest, OAuthFlow, TokenResponse, verify_state};
pub use pkce::PkceChallenge;
pub use provider::IdentityProvider;
pub use providers::{GoogleEndpoints, GoogleProvider};
