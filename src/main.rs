//! Relay Proxy
//!
//! An inspecting HTTP reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────┐
//!                         │                 RELAY PROXY                    │
//!     Client Request      │  ┌─────────┐   ┌─────────┐   ┌─────────────┐  │
//!     ────────────────────┼─▶│   net   │──▶│  http   │──▶│   routing   │  │
//!                         │  │listener │   │ server  │   │ route table │  │
//!                         │  └─────────┘   └─────────┘   └──────┬──────┘  │
//!                         │                                     ▼         │
//!     Client Response     │  ┌─────────┐   ┌─────────────┐  ┌─────────┐   │
//!     ◀───────────────────┼──│ capture │◀──│  forwarder  │◀─│upstream │◀──┼── Upstream
//!                         │  │log store│   │             │  │  call   │   │
//!                         │  └─────────┘   └─────────────┘  └─────────┘   │
//!                         │                                               │
//!                         │  engine (control surface) ◀── admin API       │
//!                         │  replay · settings · lifecycle · observability│
//!                         └────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use relay_proxy::admin::setup_admin_router;
use relay_proxy::config::{load_config, validation::validate_config, RelayConfig, SettingsStore};
use relay_proxy::lifecycle::signals::shutdown_signal;
use relay_proxy::observability::{logging, metrics};
use relay_proxy::ProxyEngine;

#[derive(Parser)]
#[command(name = "relay-proxy")]
#[command(about = "Inspecting HTTP reverse proxy", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the proxy port (persisted)
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the settings file path
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Start proxying immediately when routes are configured
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if args.autostart {
        config.autostart = true;
    }
    if let Some(path) = &args.settings {
        config.settings.path = path.to_string_lossy().into_owned();
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("Invalid configuration: {}", e);
        }
        return Err("configuration validation failed".into());
    }

    logging::init_logging(&config.observability);
    tracing::info!("relay-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let settings = SettingsStore::new(&config.settings.path);
    let engine = Arc::new(ProxyEngine::new(&config, settings)?);

    if let Some(port) = args.port {
        engine.set_port(i64::from(port)).await?;
    }

    tracing::info!(
        port = engine.port(),
        routes = engine.routes().len(),
        max_logs = config.capture.max_logs,
        "Configuration loaded"
    );

    if config.autostart {
        match engine.start().await {
            Ok(addr) => tracing::info!(address = %addr, "Proxy autostarted"),
            Err(e) => tracing::warn!(error = %e, "Proxy autostart skipped"),
        }
    }

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Control API listening");

        axum::serve(listener, setup_admin_router(engine.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    if engine.is_running().await {
        engine.stop().await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
