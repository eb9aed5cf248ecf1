//! service-gateway
//!
//! A configuration-driven API gateway built with Tokio, Axum, and reqwest.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    SERVICE GATEWAY                    │
//!                     │                                                       │
//!   Client Request    │  ┌─────────┐   ┌─────────┐   ┌───────────┐           │
//!   ──────────────────┼─▶│  http   │──▶│ routing │──▶│   guard   │           │
//!                     │  │ server  │   │  table  │   │ + extract │           │
//!                     │  └─────────┘   └─────────┘   └─────┬─────┘           │
//!                     │                                    ▼                  │
//!                     │               ┌──────────────────────────────┐       │
//!                     │               │ gateway: split → encode →    │       │
//!                     │               │ resolve → headers → client   │───────┼──▶ Service
//!                     │               └──────────────┬───────────────┘       │
//!   Client Response   │  ┌─────────┐                 │                        │
//!   ◀─────────────────┼──│ render  │◀────────────────┘                        │
//!                     │  └─────────┘                                          │
//!                     │  config · observability · lifecycle                   │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_gateway::config::load_config;
use service_gateway::lifecycle::{spawn_signal_listener, Shutdown};
use service_gateway::observability::{init_logging, init_metrics};
use service_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "service-gateway")]
#[command(about = "Configuration-driven API gateway", long_about = None)]
struct Cli {
    /// Path to the gateway configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "service-gateway starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    if cli.check {
        for route in &config.routes {
            println!("{} {} {} -> {}", route.name, route.method, route.mounted_path(), route.service_url);
        }
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
