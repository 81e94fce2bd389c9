//! dynapi-server: generic table CRUD over HTTP.
//!
//! Usage:
//!   dynapi-server --config dynapi.toml
//!   DATABASE_URL=postgres://... dynapi-server --bind 127.0.0.1:8000

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dynapi_server::config::{Config, DEFAULT_CONFIG_PATH};
use dynapi_server::{AppState, build_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dynapi-server")]
#[command(about = "Generic insert/update/delete/get endpoint for PostgreSQL tables")]
struct Args {
    /// Path to the TOML config file (default: dynapi.toml, optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on; overrides server.bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Load and validate the configuration, print it, then exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = Config::load(&path, args.config.is_some())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    if args.check_config {
        let mut shown = config.clone();
        shown.database.url = config.redacted_database_url();
        print!("{}", toml::to_string_pretty(&shown)?);
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_filter))
        .context("invalid server.log_filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config.server.base_path);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(
        addr = %listener.local_addr()?,
        base_path = %config.server.base_path,
        database = %config.redacted_database_url(),
        "dynapi-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("dynapi-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
