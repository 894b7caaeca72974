//! Webhook Router
//!
//! Routes inbound Slack-style webhooks to one of several registered
//! backends ("developers").
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                   WEBHOOK ROUTER                     │
//!                        │                                                      │
//!     Slack Request      │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!     ───────────────────┼─▶│  http   │───▶│ routing  │───▶│load_balancer │     │
//!                        │  │ server  │    │ matcher  │    │  selector    │     │
//!                        │  └─────────┘    │ + dedup  │    └──────┬───────┘     │
//!                        │                 └──────────┘           │             │
//!                        │                                        ▼             │
//!     Slack Response     │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!     ◀──────────────────┼──│response │◀───│  health  │◀───│  forwarder   │◀────┼──── Developer
//!                        │  │ mapping │    │ tracker  │    │ (3s budget)  │     │     Backend
//!                        │  └─────────┘    └──────────┘    └──────────────┘     │
//!                        │                                                      │
//!                        │  config · observability · resilience · lifecycle     │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use webhook_router::config::load_from_sources;
use webhook_router::lifecycle;
use webhook_router::observability::logging;

#[derive(Parser)]
#[command(name = "webhook-router")]
#[command(about = "Routes Slack webhooks to registered developer backends", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Environment records are applied on top.
    #[arg(short, long, env = "WEBHOOK_ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_from_sources(args.config.as_deref(), std::env::vars())?;
    logging::init_tracing(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        endpoints = config.endpoints.len(),
        strategy = %config.balancer.strategy,
        "webhook-router starting"
    );

    lifecycle::run(config).await?;
    Ok(())
}
