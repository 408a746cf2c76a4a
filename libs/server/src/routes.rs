use crate::{
    auth::{MaybeUser, RequireUser},
    error::{ApiError, PageError},
    login::{google_callback_handler, google_login_handler, logout_handler},
    state::AppState,
    views,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::Html,
    routing::{get, post},
};
use harmonist_api::StorageError;
use harmonist_shared::models::Identity;
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    environment: &'static str,
    timestamp: String,
    version: &'static str,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Identity>,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: u64,
}

#[derive(Debug, Serialize)]
struct ClickResponse {
    success: bool,
    count: u64,
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    page_router()
        .merge(api_router())
        .nest_service("/public", static_files)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn page_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_handler))
        .route("/help", get(help_handler))
        .route("/health", get(health_handler))
        .route("/auth/google", get(google_login_handler))
        .route("/auth/google/callback", get(google_callback_handler))
        .route("/logout", get(logout_handler))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/user", get(user_handler))
        .route("/api/click-count", get(click_count_handler))
        .route("/api/click", post(click_handler))
}

async fn home_handler(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<Vec<(String, String)>>,
) -> Html<String> {
    let quote = state.quotes.fetch_quote().await;
    // Any query string renders the page; only `error=auth` changes it
    let auth_error = params
        .iter()
        .any(|(key, value)| key == "error" && value == "auth");

    Html(views::home_page(&quote, user.as_ref(), auth_error).into_string())
}

async fn help_handler(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, PageError> {
    let show_detail = !state.config.is_production();
    let page_error = |error: StorageError| PageError::internal(error, show_detail);

    let count = state.storage.click_count().await.map_err(page_error)?;
    let contributed = match &user {
        Some(user) => Some(
            state
                .storage
                .has_contributed(&user.id)
                .await
                .map_err(page_error)?,
        ),
        None => None,
    };

    Ok(Html(
        views::help_page(count, user.as_ref(), contributed).into_string(),
    ))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        environment: state.config.environment.as_str(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

async fn user_handler(MaybeUser(user): MaybeUser) -> Json<UserResponse> {
    Json(UserResponse {
        authenticated: user.is_some(),
        user,
    })
}

async fn click_count_handler(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state.storage.click_count().await?;
    Ok(Json(CountResponse { count }))
}

async fn click_handler(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ClickResponse>, ApiError> {
    match state.storage.record_contribution(&user).await {
        Ok(receipt) => {
            tracing::info!(identity = %user.id, count = receipt.count, "contribution recorded");
            Ok(Json(ClickResponse {
                success: true,
                count: receipt.count,
            }))
        }
        Err(StorageError::AlreadyContributed) => {
            tracing::info!(identity = %user.id, "repeat contribution rejected");
            Err(ApiError::AlreadyContributed)
        }
        Err(error) => Err(error.into()),
    }
}

async fn not_found_handler() -> PageError {
    PageError::not_found()
}
