//! # articles-api entry point
//!
//! Loads the layered configuration, installs logging, opens the article store
//! and serves the API until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use articles::config::{AppConfig, ENVIRONMENT_VAR, Environment};
use articles::logging;
use articles::server::ServerBuilder;
use articles::storage::connect_store;
use clap::Parser;

/// Article web API
#[derive(Parser, Debug)]
#[command(name = "articles-api", version, about, long_about = None)]
struct Cli {
    /// Directory holding appsettings.yaml and its per-environment overrides
    #[arg(long, env = "APP_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Hosting environment (Local, Development, Staging, Production, ...)
    #[arg(long, env = ENVIRONMENT_VAR)]
    environment: Option<String>,

    /// Listen address, overriding `server.bind`
    #[arg(long, env = "APP_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let environment = cli
        .environment
        .as_deref()
        .map(Environment::parse)
        .unwrap_or(Environment::Production);

    let config = match AppConfig::load(&cli.config_dir, &environment) {
        Ok(config) => config,
        Err(e) => {
            // No file sink yet: report on the console only.
            let _ = tracing_subscriber::fmt()
                .with_env_filter(logging::env_filter("info"))
                .try_init();
            tracing::error!("Host terminated unexpectedly: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Host terminated unexpectedly: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting host ({})", environment);

    match run(config, environment, cli.bind).await {
        Ok(()) => {
            tracing::info!("Host stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Host terminated unexpectedly: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig, environment: Environment, bind: Option<String>) -> Result<()> {
    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let store = connect_store(&config.database).await?;

    ServerBuilder::new()
        .with_config(config)
        .with_environment(environment)
        .with_store(store)
        .serve(&addr)
        .await
}
