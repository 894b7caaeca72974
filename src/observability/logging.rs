//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log filter from the environment or configuration
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Human-readable fmt output; fields stay structured (`key = value`)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default directives when the configured level is used.
pub fn default_directives(level: &str) -> String {
    format!("webhook_router={level},tower_http={level}")
}

/// Install the global subscriber. A second call is ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_crate_and_http_layers() {
        assert_eq!(default_directives("debug"), "webhook_router=debug,tower_http=debug");
    }
}
