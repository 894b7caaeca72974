//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, webhook fallback)
//!     → request.rs (request ID, buffered InboundRequest, affinity/idempotency keys)
//!     → [routing engine selects a backend]
//!     → forwarder.rs (outbound call under the time budget, headers.rs allow-list)
//!     → response.rs (relay upstream response or map the error)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardError, ForwardErrorKind, ForwardResponse, Forwarder};
pub use request::{InboundRequest, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
