//! `LineChat` server -- minimal multi-client line chat.
//!
//! Runs a stream (TCP) listener and a datagram (UDP) listener side by
//! side. Each transport has its own independent session registry;
//! sessions never cross transports.
//!
//! # Usage
//!
//! ```bash
//! # Run on default addresses 0.0.0.0:5000 (TCP) and 0.0.0.0:5001 (UDP)
//! cargo run --bin linechat-server
//!
//! # Run on custom addresses
//! cargo run --bin linechat-server -- --tcp-addr 127.0.0.1:6000 --udp-addr 127.0.0.1:6001
//!
//! # Or via environment variables
//! LINECHAT_TCP_ADDR=127.0.0.1:6000 cargo run --bin linechat-server
//! ```

use std::sync::Arc;

use clap::Parser;

use linechat_server::config::{CliArgs, ServerConfig};
use linechat_server::registry::SessionRegistry;
use linechat_server::{tcp, udp};

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(tcp = %config.tcp_addr, udp = %config.udp_addr, "starting linechat server");

    // Separate transports, separate registries.
    let tcp_registry = Arc::new(SessionRegistry::new());
    let udp_registry = Arc::new(SessionRegistry::new());

    let tcp_handle = match tcp::start_server(&config.tcp_addr, tcp_registry).await {
        Ok((addr, handle)) => {
            tracing::info!(addr = %addr, "stream listener ready");
            handle
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start stream listener");
            std::process::exit(1);
        }
    };

    let udp_handle = match udp::start_server(&config.udp_addr, udp_registry).await {
        Ok((addr, handle)) => {
            tracing::info!(addr = %addr, "datagram listener ready");
            handle
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start datagram listener");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::try_join!(tcp_handle, udp_handle) {
        tracing::error!(error = %e, "listener task failed");
    }
}
