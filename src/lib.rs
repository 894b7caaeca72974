//! Webhook router library.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::WebhookRouter;
