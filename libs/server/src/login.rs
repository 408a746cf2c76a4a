//! Google sign-in and sign-out

use crate::{
    auth::{
        OAUTH_COOKIE, PendingLogin, SESSION_COOKIE, pending_login_cookie, removal_cookie,
        session_cookie,
    },
    state::AppState,
};
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::PrivateCookieJar;
use chrono::{DateTime, Utc};
use harmonist_shared::{
    models::Identity,
    oauth::{OAuthError, OAuthResult, verify_state},
    utils::generate_token,
};
use serde::Deserialize;

const LOGIN_FAILED_REDIRECT: &str = "/?error=auth";

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

pub async fn google_login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let request = state.oauth.authorization_request();
    let pending = PendingLogin {
        state: request.state,
        verifier: request.pkce_verifier,
    };

    let value = match serde_json::to_string(&pending) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(%error, "failed to encode pending login");
            return (jar, Redirect::to(LOGIN_FAILED_REDIRECT));
        }
    };

    tracing::debug!(provider = state.provider.id(), "starting sign-in");
    let jar = jar.add(pending_login_cookie(value, &state.config));
    (jar, Redirect::to(&request.url))
}

pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> (PrivateCookieJar, Redirect) {
    let pending = jar
        .get(OAUTH_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.remove(removal_cookie(OAUTH_COOKIE));

    let identity = match complete_login(&state, pending.as_deref(), params).await {
        Ok(identity) => identity,
        Err(error) => {
            tracing::warn!(provider = state.provider.id(), %error, "sign-in failed");
            return (jar, Redirect::to(LOGIN_FAILED_REDIRECT));
        }
    };

    // Replace any session this browser already had
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        if let Err(error) = state.storage.delete_session(previous.value()).await {
            tracing::warn!(%error, "failed to delete previous session");
        }
    }

    let token = generate_token(32);
    let Some(expires_at) = session_expiry(Utc::now(), state.config.session_ttl) else {
        tracing::error!(ttl = ?state.config.session_ttl, "session ttl out of range");
        return (jar, Redirect::to(LOGIN_FAILED_REDIRECT));
    };

    if let Err(error) = state
        .storage
        .create_session(&token, &identity, expires_at)
        .await
    {
        tracing::error!(%error, identity = %identity.id, "failed to create session");
        return (jar, Redirect::to(LOGIN_FAILED_REDIRECT));
    }

    tracing::info!(identity = %identity.id, "signed in");
    let jar = jar.add(session_cookie(token, &state.config));
    (jar, Redirect::to("/"))
}

/// `None` when the ttl cannot be represented as a timestamp
fn session_expiry(now: DateTime<Utc>, ttl: std::time::Duration) -> Option<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).ok()?;
    now.checked_add_signed(ttl)
}

async fn complete_login(
    state: &AppState,
    pending: Option<&str>,
    params: CallbackParams,
) -> OAuthResult<Identity> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        return Err(OAuthError::AuthorizationDenied(
            format!("{error} {description}").trim().to_string(),
        ));
    }

    let pending: PendingLogin = match pending {
        Some(value) => serde_json::from_str(value)?,
        None => return Err(OAuthError::invalid_callback("no sign-in in progress")),
    };

    verify_state(&pending.state, params.state.as_deref().unwrap_or_default())?;

    let code = params
        .code
        .ok_or_else(|| OAuthError::invalid_callback("missing authorization code"))?;

    let tokens = state.oauth.exchange_code(&code, &pending.verifier).await?;
    state
        .provider
        .fetch_identity(state.oauth.http_client(), &tokens)
        .await
}

pub async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    let Some(token) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) else {
        return (jar, Redirect::to("/"));
    };

    if let Err(error) = state.storage.delete_session(&token).await {
        tracing::error!(%error, "failed to delete session on logout");
    }

    tracing::debug!("signed out");
    (jar.remove(removal_cookie(SESSION_COOKIE)), Redirect::to("/"))
}
