use reqwest::{Client, header::HeaderMap};
use std::time::Duration;

/// Settings for outbound HTTPS clients
#[derive(Debug, Clone)]
pub struct TlsClientConfig {
    pub headers: HeaderMap,
    /// Total request timeout, including connect and body
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TlsClientConfig {
    fn default() -> Self {
        Self {
            headers: HeaderMap::new(),
            timeout: Some(Duration::from_secs(10)),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("harmonist/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TlsClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }
}

pub fn create_tls_client(config: TlsClientConfig) -> Result<Client, String> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .default_headers(config.headers)
        .user_agent(config.user_agent)
        .connect_timeout(config.connect_timeout);

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_timeout_caps_connect_timeout() {
        let config = TlsClientConfig::default().with_timeout(Duration::from_secs(2));

        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_create_client_with_defaults() {
        assert!(create_tls_client(TlsClientConfig::default()).is_ok());
    }
}
