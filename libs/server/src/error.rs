use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use harmonist_api::StorageError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("session secret must be at least {minimum} bytes (got {actual})")]
    SessionSecretTooShort { actual: usize, minimum: usize },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("public url must start with http:// or https:// (got '{0}')")]
    InvalidPublicUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("session ttl must be at most {maximum_hours} hours (got {actual_hours})")]
    SessionTtlTooLong { actual_hours: u64, maximum_hours: u64 },
}

/// Errors returned by the JSON endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("this account has already contributed")]
    AlreadyContributed,

    #[error("storage error: {0}")]
    Storage(StorageError),
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
    code: String,
    request_id: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::AlreadyContributed => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::AlreadyContributed => "already_contributed",
            ApiError::Storage(_) => "internal_error",
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::AlreadyContributed => ApiError::AlreadyContributed,
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Storage(error) => {
                tracing::error!(%error, "storage failure while handling api request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        api_error(self.status(), self.code(), &message)
    }
}

pub fn api_error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ApiErrorBody {
        error: message.to_string(),
        code: code.to_string(),
        request_id: format!("req_{}", Uuid::new_v4().simple()),
    };

    (status, Json(body)).into_response()
}

/// Errors rendered as HTML pages
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub title: &'static str,
    /// Only shown outside production
    pub detail: Option<String>,
}

impl PageError {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: "Page not found",
            detail: None,
        }
    }

    pub fn internal(error: impl std::fmt::Display, show_detail: bool) -> Self {
        tracing::error!(%error, "failed to render page");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            title: "Something went wrong",
            detail: show_detail.then(|| error.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let markup = crate::views::error_page(self.status, self.title, self.detail.as_deref());
        (self.status, Html(markup.into_string())).into_response()
    }
}
