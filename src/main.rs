//! RoomOSC GW - Rust implementation
//!
//! OSC bridge between a control surface and a room-conferencing controller.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomosc_gw::config::{AppConfig, ConfigWatcher};
use roomosc_gw::feedback::FeedbackCallback;
use roomosc_gw::{cli, sniffer, Session, SessionHooks};

/// RoomOSC Gateway - drive conferencing rooms over OSC
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print every datagram on the listen port without touching state
    #[arg(long)]
    sniffer: bool,

    /// Run an interactive console against the live session
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting RoomOSC GW v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if !Path::new(&args.config).exists() {
        AppConfig::default()
            .save(&args.config)
            .await
            .context("Failed to write default config")?;
        info!("Created default configuration at {}", args.config);
    }

    if args.sniffer {
        let config = AppConfig::load(&args.config).await?;
        sniffer::run_cli_sniffer(config.device.listen_port, &config.device.output_header).await?;
        return Ok(());
    }

    let (config_watcher, initial_config) = ConfigWatcher::new(args.config.clone()).await?;
    info!("Configuration loaded successfully with hot-reload enabled");

    let log_feedback: FeedbackCallback = Arc::new(|id: &str, state: bool| {
        info!("💡 Feedback {} -> {}", id, if state { "ON" } else { "off" });
    });
    let hooks = SessionHooks {
        feedbacks: vec![log_feedback],
        ..Default::default()
    };

    let session = Session::start((*initial_config).clone(), hooks).await?;

    if args.interactive {
        let (request_tx, request_rx) = mpsc::channel(32);
        let session_task = tokio::spawn(session.run(
            Some(request_rx),
            Some(config_watcher),
            shutdown_signal(),
        ));

        if let Err(e) = cli::run_repl(request_tx).await {
            error!("Console error: {:#}", e);
        }
        session_task.await??;
    } else {
        session
            .run(None, Some(config_watcher), shutdown_signal())
            .await?;
    }

    info!("RoomOSC GW shutdown complete");
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
