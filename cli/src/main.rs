use clap::Parser;
use harmonist_server::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Commands;

#[derive(Parser, PartialEq, Debug)]
#[command(name = "harmonist")]
#[command(about = "Quote of the day with a one-click-per-person counter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.command.environment());

    if let Err(e) = cli.command.run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(environment: Environment) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(environment).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_log_filter(environment: Environment) -> String {
    match environment {
        Environment::Production => "info".to_string(),
        Environment::Development => format!(
            "info,{}=debug,harmonist_server=debug,harmonist_api=debug",
            env!("CARGO_CRATE_NAME")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::ServeArgs;

    fn serve_args(extra: &[&str]) -> ServeArgs {
        let mut argv = vec![
            "harmonist",
            "serve",
            "--session-secret",
            "0123456789abcdef0123456789abcdef",
            "--google-client-id",
            "client-id",
            "--google-client-secret",
            "client-secret",
        ];
        argv.extend_from_slice(extra);

        match Cli::try_parse_from(argv) {
            Ok(Cli {
                command: Commands::Serve(args),
            }) => args,
            Ok(other) => panic!("expected serve command, got {other:?}"),
            Err(error) => panic!("failed to parse args: {error}"),
        }
    }

    #[test]
    fn serve_flags_map_to_config() {
        let args = serve_args(&[
            "--bind",
            "127.0.0.1",
            "--port",
            "8080",
            "--environment",
            "production",
            "--public-url",
            "https://harmonist.app",
            "--database-url",
            ":memory:",
            "--quote-timeout-secs",
            "2",
            "--session-ttl-hours",
            "1",
            "--static-dir",
            "assets",
        ]);
        let config = args.into_config();

        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            config.callback_url(),
            "https://harmonist.app/auth/google/callback"
        );
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.quote_timeout, std::time::Duration::from_secs(2));
        assert_eq!(config.session_ttl, std::time::Duration::from_secs(3600));
        assert_eq!(config.static_dir, std::path::PathBuf::from("assets"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let result = Cli::try_parse_from([
            "harmonist",
            "serve",
            "--environment",
            "staging",
            "--session-secret",
            "0123456789abcdef0123456789abcdef",
            "--google-client-id",
            "id",
            "--google-client-secret",
            "secret",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn migrate_defaults_to_development_logging() {
        let cli = match Cli::try_parse_from(["harmonist", "migrate", "--database-url", "x.db"]) {
            Ok(cli) => cli,
            Err(error) => panic!("failed to parse args: {error}"),
        };
        assert_eq!(cli.command.environment(), Environment::Development);
    }

    #[test]
    fn log_filter_depends_on_environment() {
        assert_eq!(default_log_filter(Environment::Production), "info");
        assert!(default_log_filter(Environment::Development).contains("harmonist=debug"));
    }
}
