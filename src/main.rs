use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dentdir_api::backend::{self, Backend};
use dentdir_api::config::{self, AppConfig, BackendKind};
use dentdir_api::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "dentdir-api", version, about = "Dentist directory API server")]
struct Args {
    /// YAML file layered over the environment preset
    #[arg(long, env = "DENTDIR_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// rest | memory
    #[arg(long)]
    backend: Option<BackendKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, SITE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dentdir_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => config::config().clone(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(kind) = args.backend {
        config.backend.kind = kind;
    }

    tracing::info!("Starting dentdir API in {:?} mode", config.environment);
    if dentdir_api::is_production!(config) && config.backend.kind == BackendKind::Memory {
        anyhow::bail!("the in-memory backend cannot be used in production");
    }

    let backend = backend::from_config(&config.backend).context("failed to build backend")?;
    tracing::info!("Backend: {}", backend.name());
    if config.telemetry.endpoint.is_none() {
        tracing::info!("Telemetry disabled (TELEMETRY_URL not set)");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, backend);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
