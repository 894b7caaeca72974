//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RouterConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {address}: {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Boot the router with a validated configuration and serve until a shutdown signal.
pub async fn run(config: RouterConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let address = config.observability.metrics_address.clone();
        let addr: SocketAddr = address
            .parse()
            .map_err(|source| StartupError::MetricsAddress { address, source })?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let watcher = signals::spawn_signal_watcher(shutdown.clone());

    server.run(listener, shutdown.signalled()).await?;
    watcher.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
