use chrono::Utc;
use clap::{Args, Subcommand};
use harmonist_api::{
    AppStorage, ContributionLedger, DEFAULT_QUOTE_API_URL, LocalStorage, QuoteClient,
    SessionStore, local::migrations,
};
use harmonist_server::{AppState, Environment, ServerConfig};
use harmonist_shared::{
    oauth::GoogleProvider,
    tls_client::{TlsClientConfig, create_tls_client},
};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};

const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Subcommand, PartialEq, Debug)]
pub enum Commands {
    /// Start the web server
    Serve(ServeArgs),

    /// Apply pending database migrations (or roll back the latest one)
    Migrate {
        /// libsql database path
        #[arg(long, env = "DATABASE_URL", default_value = "harmonist.db")]
        database_url: String,

        /// Roll back the most recently applied migration
        #[arg(long, default_value_t = false)]
        rollback: bool,
    },
}

#[derive(Args, PartialEq, Debug)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "HARMONIST_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = harmonist_server::config::DEFAULT_PORT)]
    pub port: u16,

    /// development or production
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub environment: Environment,

    /// External base URL used for the OAuth callback (required in production)
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Secret the cookie encryption key is derived from (at least 32 bytes)
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: String,

    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: String,

    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: String,

    /// libsql database path, or :memory:
    #[arg(long, env = "DATABASE_URL", default_value = "harmonist.db")]
    pub database_url: String,

    #[arg(long, env = "QUOTE_API_URL", default_value = DEFAULT_QUOTE_API_URL)]
    pub quote_api_url: String,

    #[arg(long, env = "QUOTE_TIMEOUT_SECS", default_value_t = 5)]
    pub quote_timeout_secs: u64,

    /// Session lifetime in hours
    #[arg(long, env = "SESSION_TTL_HOURS", default_value_t = 24)]
    pub session_ttl_hours: u64,

    /// Directory served under /public
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            port: self.port,
            environment: self.environment,
            public_url: self.public_url.filter(|url| !url.trim().is_empty()),
            session_secret: SecretString::from(self.session_secret),
            google_client_id: self.google_client_id,
            google_client_secret: SecretString::from(self.google_client_secret),
            database_url: self.database_url,
            quote_api_url: self.quote_api_url,
            quote_timeout: Duration::from_secs(self.quote_timeout_secs),
            session_ttl: Duration::from_secs(self.session_ttl_hours.saturating_mul(60 * 60)),
            static_dir: self.static_dir,
        }
    }
}

impl Commands {
    pub fn environment(&self) -> Environment {
        match self {
            Commands::Serve(args) => args.environment,
            Commands::Migrate { .. } => Environment::Development,
        }
    }

    pub async fn run(self) -> Result<(), String> {
        match self {
            Commands::Serve(args) => serve(args.into_config()).await,
            Commands::Migrate {
                database_url,
                rollback,
            } => migrate(&database_url, rollback).await,
        }
    }
}

async fn serve(config: ServerConfig) -> Result<(), String> {
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    let storage = LocalStorage::new(&config.database_url)
        .await
        .map_err(|e| format!("Failed to open database {}: {}", config.database_url, e))?;

    let count = storage
        .reconcile_counter()
        .await
        .map_err(|e| format!("Failed to reconcile click counter: {}", e))?;
    let pruned = storage
        .prune_expired_sessions(Utc::now())
        .await
        .map_err(|e| format!("Failed to prune expired sessions: {}", e))?;
    tracing::info!(count, pruned, database = %config.database_url, "storage ready");

    let storage: Arc<dyn AppStorage> = Arc::new(storage);
    spawn_session_pruner(storage.clone());

    let quotes = QuoteClient::new(config.quote_api_url.clone(), config.quote_timeout)?;
    let http_client = create_tls_client(TlsClientConfig::default())?;
    let provider = Arc::new(GoogleProvider::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    ));

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", listen_addr, e))?;

    let public_url = config.public_base_url();
    let environment = config.environment;
    let state = AppState::new(config, storage, quotes, provider, http_client);
    let app = harmonist_server::router(state);

    println!("Harmonist listening on http://{}", listen_addr);
    println!("Public URL: {}", public_url);
    println!("Environment: {}", environment);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    tracing::info!("server stopped");
    Ok(())
}

fn spawn_session_pruner(storage: Arc<dyn AppStorage>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
        // The first tick fires immediately and startup already pruned
        interval.tick().await;
        loop {
            interval.tick().await;
            match storage.prune_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(pruned) => tracing::debug!(pruned, "pruned expired sessions"),
                Err(error) => tracing::error!(%error, "failed to prune expired sessions"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}

async fn migrate(database_url: &str, rollback: bool) -> Result<(), String> {
    // Opening the store applies pending migrations
    let storage = LocalStorage::new(database_url)
        .await
        .map_err(|e| format!("Failed to open database {}: {}", database_url, e))?;
    let conn = storage.connection().lock().await;

    if rollback {
        match migrations::rollback_last(&conn)
            .await
            .map_err(|e| e.to_string())?
        {
            Some(version) => println!("Rolled back migration v{:03}", version),
            None => println!("No migrations to roll back"),
        }
    }

    let version = migrations::current_version(&conn)
        .await
        .map_err(|e| e.to_string())?;
    println!("{} is at schema version {}", database_url, version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrate_rollback_leaves_previous_version() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temp dir: {error}"),
        };
        let path = dir.path().join("harmonist.db");
        let path = path.to_string_lossy().to_string();

        if let Err(error) = migrate(&path, false).await {
            panic!("migrate failed: {error}");
        }
        if let Err(error) = migrate(&path, true).await {
            panic!("rollback failed: {error}");
        }

        // Reopening re-applies what was rolled back
        let storage = match LocalStorage::new(&path).await {
            Ok(storage) => storage,
            Err(error) => panic!("failed to reopen: {error}"),
        };
        let conn = storage.connection().lock().await;
        match migrations::current_version(&conn).await {
            Ok(version) => assert_eq!(version, 2),
            Err(error) => panic!("failed to read version: {error}"),
        }
    }

    #[tokio::test]
    async fn serve_rejects_invalid_config_before_binding() {
        let mut config = ServerConfig::new(
            SecretString::from("short".to_string()),
            "id",
            SecretString::from("secret".to_string()),
        );
        config.database_url = ":memory:".to_string();

        let error = match serve(config).await {
            Ok(()) => panic!("serve should refuse a short session secret"),
            Err(error) => error,
        };
        assert!(error.starts_with("Invalid configuration"));
    }

    #[test]
    fn oversized_session_ttl_fails_validation() {
        let args = |session_ttl_hours| ServeArgs {
            bind: "0.0.0.0".to_string(),
            port: 3001,
            environment: Environment::Development,
            public_url: Some("  ".to_string()),
            session_secret: "s".repeat(32),
            google_client_id: "id".to_string(),
            google_client_secret: "secret".to_string(),
            database_url: ":memory:".to_string(),
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            quote_timeout_secs: 5,
            session_ttl_hours,
            static_dir: PathBuf::from("public"),
        };

        let config = args(u64::MAX).into_config();
        assert_eq!(config.session_ttl, Duration::from_secs(u64::MAX));
        assert!(config.public_url.is_none());
        assert!(config.validate().is_err());

        assert!(args(3_000_000_000).into_config().validate().is_err());
        assert!(args(24).into_config().validate().is_ok());
    }
}
