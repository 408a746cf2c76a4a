use crate::error::ConfigError;
use harmonist_api::{DEFAULT_QUOTE_API_URL, DEFAULT_QUOTE_TIMEOUT};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

/// Minimum length of the secret the cookie key is derived from
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{other}' (expected 'development' or 'production')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub environment: Environment,
    /// External base URL, used to build the OAuth callback
    pub public_url: Option<String>,
    pub session_secret: SecretString,
    pub google_client_id: String,
    pub google_client_secret: SecretString,
    pub database_url: String,
    pub quote_api_url: String,
    pub quote_timeout: Duration,
    pub session_ttl: Duration,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Development defaults around the three required secrets
    pub fn new(
        session_secret: SecretString,
        google_client_id: impl Into<String>,
        google_client_secret: SecretString,
    ) -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            environment: Environment::Development,
            public_url: None,
            session_secret,
            google_client_id: google_client_id.into(),
            google_client_secret,
            database_url: "harmonist.db".to_string(),
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
            session_ttl: DEFAULT_SESSION_TTL,
            static_dir: PathBuf::from("public"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret_len = self.session_secret.expose_secret().len();
        if secret_len < MIN_SESSION_SECRET_BYTES {
            return Err(ConfigError::SessionSecretTooShort {
                actual: secret_len,
                minimum: MIN_SESSION_SECRET_BYTES,
            });
        }

        if self.google_client_id.trim().is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_ID"));
        }
        if self.google_client_secret.expose_secret().trim().is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"));
        }

        match self.public_url.as_deref() {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(ConfigError::InvalidPublicUrl(url.to_string()));
            }
            None if self.is_production() => return Err(ConfigError::Missing("PUBLIC_URL")),
            _ => {}
        }

        if self.quote_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("quote timeout"));
        }
        if self.session_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("session ttl"));
        }
        if self.session_ttl > MAX_SESSION_TTL {
            return Err(ConfigError::SessionTtlTooLong {
                actual_hours: self.session_ttl.as_secs() / 3600,
                maximum_hours: MAX_SESSION_TTL.as_secs() / 3600,
            });
        }

        Ok(())
    }

    /// Base URL the browser reaches us on, without a trailing slash
    pub fn public_base_url(&self) -> String {
        match self.public_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    pub fn callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.public_base_url())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::new(
            SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
            "client-id",
            SecretString::from("client-secret".to_string()),
        )
    }

    #[test]
    fn defaults_are_valid_in_development() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.callback_url(), "http://localhost:3001/auth/google/callback");
        assert_eq!(config.listen_addr(), "0.0.0.0:3001");
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut config = config();
        config.session_secret = SecretString::from("too-short".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SessionSecretTooShort { actual: 9, .. })
        ));
    }

    #[test]
    fn production_requires_public_url() {
        let mut config = config();
        config.environment = Environment::Production;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("PUBLIC_URL"))
        ));

        config.public_url = Some("https://harmonist.app/".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(
            config.callback_url(),
            "https://harmonist.app/auth/google/callback"
        );
    }

    #[test]
    fn public_url_must_be_http() {
        let mut config = config();
        config.public_url = Some("harmonist.app".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPublicUrl(_))
        ));
    }

    #[test]
    fn missing_google_credentials_are_rejected() {
        let mut config = config();
        config.google_client_id = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("GOOGLE_CLIENT_ID"))
        ));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let mut config = config();
        config.quote_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration(_))
        ));
    }

    #[test]
    fn session_ttl_is_capped_at_a_year() {
        let mut config = config();
        config.session_ttl = MAX_SESSION_TTL;
        assert!(config.validate().is_ok());

        config.session_ttl = Duration::from_secs(3_000_000_000 * 60 * 60);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SessionTtlTooLong {
                maximum_hours: 8760,
                ..
            })
        ));

        config.session_ttl = Duration::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!(
            "Development".parse::<Environment>(),
            Ok(Environment::Development)
        );
        assert!("staging".parse::<Environment>().is_err());
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
