//! server: board-side daemon. Binds a UDP control socket, drives an
//! in-memory mock camera, and answers the Compound Pi control protocol.

use std::path::PathBuf;
use std::sync::Arc;

use camera::MockCamera;
use clap::Parser;
use repeater::RepeaterConfig;
use server::{Dispatcher, ServerConfig, load_config, load_config_from_path};
use tokio::net::UdpSocket;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "server", about = "Compound Pi board-side control daemon")]
struct Args {
    /// Path to a TOML config file. Falls back to documented defaults if unset.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "server starting");

    let args = Args::parse();
    let config: ServerConfig = match &args.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    }
    .unwrap_or_else(|error| {
        info!(%error, "using documented default config");
        ServerConfig::default()
    });

    let bind_addr = format!("{}:{}", config.udp_bind, config.udp_port);
    let socket = match UdpSocket::bind(&bind_addr).await {
        Ok(socket) => Arc::new(socket),
        Err(error) => {
            eprintln!("FATAL: failed to bind UDP socket on {bind_addr}: {error}");
            std::process::exit(1);
        }
    };
    info!(%bind_addr, "UDP socket bound");

    let camera = Arc::new(MockCamera::new());
    let repeater_config = RepeaterConfig {
        interval_max: config.repeater_interval_max,
        deadline: config.repeater_deadline,
    };

    let mut dispatcher = Dispatcher::new(socket, camera, repeater_config);
    dispatcher.run().await;
}
