pub mod models;
pub mod oauth;
pub mod tls_client;
pub mod utils;
