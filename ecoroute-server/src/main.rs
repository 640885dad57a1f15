use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use ecoroute_server::{AppState, ServerConfig, app};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ecoroute-server", about = "Serve arc predictions and least-cost routes")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Address to listen on, overrides the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Arc cost table, overrides the configuration
    #[arg(long)]
    arc_costs: Option<PathBuf>,
    /// Arc feature model, overrides the configuration
    #[arg(long)]
    arc_model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(path) = args.arc_costs {
        config.arc_costs_path = path;
    }
    if let Some(path) = args.arc_model {
        config.arc_model_path = path;
    }

    let load_config = config.clone();
    let state = tokio::task::spawn_blocking(move || AppState::load(&load_config)).await??;

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
