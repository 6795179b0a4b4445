//! media-hub daemon - main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mediahub_common::config::TomlConfig;
use mediahub_common::events::EventBus;
use mediahub_server::engine::headless::HeadlessEngineFactory;
use mediahub_server::power::logging::LoggingPowerClient;
use mediahub_server::security::ConfiguredContextResolver;
use mediahub_server::{api, Config, SessionBroker};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mediahub-server
#[derive(Parser, Debug)]
#[command(name = "mediahub-server")]
#[command(about = "Media playback session broker")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "MEDIAHUB_PORT")]
    port: Option<u16>,

    /// Path to TOML config file
    #[arg(short, long, env = "MEDIAHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides config file; RUST_LOG takes precedence)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = Config::from_toml(toml).with_overrides(args.port, args.log_level);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "mediahub_server={0},mediahub_common={0},tower_http={0}",
                    config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting media-hub v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Binding {}:{}", config.bind_address, config.port);

    let bus = EventBus::new(config.event_capacity);
    let broker = SessionBroker::new(
        Arc::new(HeadlessEngineFactory),
        Arc::new(LoggingPowerClient::new()),
        Arc::new(ConfiguredContextResolver::from_config(&config.security)),
        config.session_settings(),
        bus,
    );
    info!("Session broker initialized");

    api::run(&config, broker.clone(), shutdown_signal())
        .await
        .context("Server error")?;

    broker.shutdown_all();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
