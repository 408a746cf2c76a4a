//! Browser sessions
//!
//! A signed-in browser holds an encrypted `harmonist.sid` cookie whose value
//! is an opaque token. The token resolves to a [`BrowserSession`] row in
//! storage, so logging out (or expiry) takes effect server side.
//!
//! Handlers take [`MaybeUser`] when a signed-out visitor is fine and
//! [`RequireUser`] when they must be signed in.

use crate::{config::ServerConfig, error::ApiError, state::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use harmonist_api::{BrowserSession, StorageError};
use harmonist_shared::models::Identity;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

pub const SESSION_COOKIE: &str = "harmonist.sid";
pub const OAUTH_COOKIE: &str = "harmonist.oauth";

/// How long a started login may take before the callback is refused
const OAUTH_COOKIE_MAX_AGE: time::Duration = time::Duration::minutes(10);

/// Values remembered between `/auth/google` and the callback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingLogin {
    pub state: String,
    pub verifier: String,
}

pub fn session_cookie(token: String, config: &ServerConfig) -> Cookie<'static> {
    let max_age = i64::try_from(config.session_ttl.as_secs()).unwrap_or(i64::MAX);

    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_production())
        .max_age(time::Duration::seconds(max_age))
        .build()
}

pub fn pending_login_cookie(value: String, config: &ServerConfig) -> Cookie<'static> {
    Cookie::build((OAUTH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_production())
        .max_age(OAUTH_COOKIE_MAX_AGE)
        .build()
}

/// Cookie matching `name` for removal from a jar
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Resolve the session cookie on a request to a live session
pub async fn current_session(
    jar: &PrivateCookieJar,
    state: &AppState,
) -> Result<Option<BrowserSession>, StorageError> {
    let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) else {
        return Ok(None);
    };

    state.storage.get_session(&token).await
}

fn request_jar(parts: &Parts, state: &AppState) -> PrivateCookieJar {
    PrivateCookieJar::from_headers(&parts.headers, state.cookie_key().clone())
}

/// The signed-in identity, if any
///
/// Storage failures are logged and treated as signed out so public pages
/// still render.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = request_jar(parts, state);
        match current_session(&jar, state).await {
            Ok(session) => Ok(MaybeUser(session.map(|session| session.identity))),
            Err(error) => {
                tracing::error!(%error, "failed to load browser session");
                Ok(MaybeUser(None))
            }
        }
    }
}

/// The signed-in identity; rejects with 401 otherwise
#[derive(Debug, Clone)]
pub struct RequireUser(pub Identity);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = request_jar(parts, state);
        match current_session(&jar, state).await? {
            Some(session) => Ok(RequireUser(session.identity)),
            None => Err(ApiError::Unauthenticated),
        }
    }
}
