use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use canvas_bridge::{ServerConfig, routes, state::AppState};

/// Canvas Bridge - voice and tool-calling bridge for the canvas client
#[derive(Parser, Debug)]
#[command(name = "canvas-bridge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        info!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    let address = config.address();
    let shutdown_timeout = config.shutdown_timeout();

    let app_state = AppState::new(config).context("Failed to load session configuration")?;
    let shutdown = app_state.shutdown.clone();
    let app = routes::create_app(app_state.clone());

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;
    let listener = TcpListener::bind(&socket_addr).await?;
    info!("Server listening on http://{}", socket_addr);

    let stop = shutdown.clone();
    let serve = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { stop.cancelled().await });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, closing sessions");
        }
    }

    shutdown.cancel();
    let drain = async move {
        let joined = server.await;
        // Upgraded sockets are not covered by the server's graceful shutdown
        app_state.wait_for_sessions().await;
        joined
    };
    match tokio::time::timeout(shutdown_timeout, drain).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            "Graceful shutdown did not finish within {}s, exiting",
            shutdown_timeout.as_secs()
        ),
    }

    info!("Server stopped");
    Ok(())
}
