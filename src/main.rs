//! HTTP round-robin load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ───────────────────▶│ http::server ──▶ http::coordinator            │
//!                         │                    │        ▲                 │
//!                         │                    ▼        │ retry/failover  │
//!                         │         load_balancer::pool (round robin)     │
//!                         │                    │                          │
//!     Client Response     │                    ▼                          │
//!     ◀───────────────────│         backend delegate (http::client) ──────┼──▶ Backend
//!                         │                                               │
//!                         │  health::active  (periodic HEAD probes) ──────┼──▶ Backends
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use lb_proxy::config::{load_config, ProxyConfig};
use lb_proxy::lifecycle::startup;
use lb_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "lb-proxy")]
#[command(about = "Round-robin HTTP load balancer with health checks and failover", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Comma-separated backend URLs (overrides the config file)
    #[arg(short, long, value_delimiter = ',')]
    backends: Option<Vec<String>>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(backends) = cli.backends {
        config.backends = backends;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        backends = config.backends.len(),
        health_interval_secs = config.health_check.interval_secs,
        "lb-proxy v0.1.0 starting"
    );

    startup::run(config).await?;
    Ok(())
}
