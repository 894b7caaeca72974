//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + process environment
//!     → loader.rs (parse, overlay env endpoint records)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → consumed once at startup to build registry, selector, forwarder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no live reconfiguration
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_sources, ConfigError};
pub use schema::{
    AdminConfig, AffinitySource, BalancerConfig, DedupConfig, EndpointConfig, ForwardingConfig,
    HealthConfig, ListenerConfig, ObservabilityConfig, RetryConfig, RouteConfig, RouterConfig,
    TimeoutConfig,
};
