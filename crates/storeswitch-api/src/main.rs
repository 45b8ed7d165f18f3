//! # storeswitch-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment
//! (see [`storeswitch_api::config`]); command-line flags override it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use storeswitch_api::config::{parse_base_url, AppConfig};

/// Storefront store switching service.
#[derive(Debug, Parser)]
#[command(name = "storeswitch-api", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Store catalog YAML (overrides STORE_CATALOG).
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Public base URL (overrides PUBLIC_BASE_URL).
    #[arg(long)]
    public_base_url: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Build configuration from environment, then apply flags.
    let mut config = AppConfig::from_env().context("reading configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }
    if let Some(base) = cli.public_base_url.as_deref() {
        config.public_base_url = parse_base_url(base)?;
    }
    let port = config.port;

    let state = storeswitch_api::bootstrap::bootstrap(config).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    let app = storeswitch_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("store switch API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
