//! Slimproto Server - Standalone headless server for Squeezebox-family players.
//!
//! This binary exposes a slimproto TCP listener that Squeezebox hardware and
//! software players (SqueezePlay, Squeezelite) connect to for transport
//! control and playback status, with no other surface attached.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use slimproto_core::{bootstrap_server, BootstrapOptions};
use tokio::signal;

use crate::config::ServerConfig;

/// Slimproto Server - Headless server for Squeezebox-family players.
#[derive(Parser, Debug)]
#[command(name = "slimproto-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SLIMPROTO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind host (overrides config file).
    #[arg(long, env = "SLIMPROTO_BIND_HOST")]
    bind_host: Option<std::net::IpAddr>,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "SLIMPROTO_BIND_PORT")]
    port: Option<u16>,

    /// Streaming port advertised to players (overrides config file).
    #[arg(long, env = "SLIMPROTO_STREAMING_PORT")]
    streaming_port: Option<u16>,

    /// Advertise IP address (overrides config file, and auto-detection).
    #[arg(short = 'a', long, env = "SLIMPROTO_ADVERTISE_IP")]
    advertise_ip: Option<std::net::IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Slimproto Server v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(bind_host) = args.bind_host {
        config.bind_host = bind_host;
    }
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(streaming_port) = args.streaming_port {
        config.streaming_port = streaming_port;
    }
    if let Some(ip) = args.advertise_ip {
        config.advertise_ip = Some(ip);
    }

    log::info!(
        "Configuration: bind={}:{}, streaming_port={}, advertise_ip={}",
        config.bind_host,
        config.bind_port,
        config.streaming_port,
        config
            .advertise_ip
            .map_or_else(|| "auto".to_string(), |ip| ip.to_string())
    );

    let bootstrapped = bootstrap_server(BootstrapOptions {
        config: config.to_core_config(),
        ..Default::default()
    });

    log::info!("Services bootstrapped successfully");

    tokio::select! {
        result = bootstrapped.run() => {
            if let Err(e) = result {
                log::error!("Server error: {}", e);
            }
        }
        () = shutdown_signal() => {
            log::info!("Shutdown signal received, cleaning up...");
        }
    }

    bootstrapped.shutdown().await;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
