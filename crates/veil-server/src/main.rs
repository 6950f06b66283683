//! Veil standalone relay server.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use veil_core::NotificationDispatcher;
use veil_server::routes::{router, AppState};
use veil_server::{AssetDir, ServerConfig};

/// Veil - pseudonymous long-poll notification relay
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address for the HTTP listener
    #[arg(long, default_value = "127.0.0.1:6378")]
    bind: String,

    /// Static asset directory
    #[arg(long, default_value = "static")]
    static_dir: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("veil_core={0},veil_server={0}", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig {
        bind: args.bind.parse()?,
        static_dir: args.static_dir.into(),
        ..ServerConfig::default()
    };

    info!("Starting Veil relay server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Listening on: {}", config.bind);
    info!("Static root: {}", config.static_dir.display());

    let state = AppState {
        dispatcher: Arc::new(NotificationDispatcher::new()),
        assets: Arc::new(AssetDir::new(config.static_dir, config.index_file)),
    };

    let listener = TcpListener::bind(config.bind).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
