//! HTTP front end for Harmonist: pages, Google sign-in and the click API

pub mod auth;
pub mod config;
pub mod error;
pub mod login;
pub mod routes;
pub mod state;
pub mod views;

pub use config::{Environment, ServerConfig};
pub use error::{ApiError, ConfigError};
pub use routes::router;
pub use state::AppState;
