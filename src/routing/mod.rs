//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, headers, body)
//!     → matcher.rs (path → service route + path remainder)
//!     → router.rs (dedup check, backend selection, forward, health report)
//!     → dedup.rs (recent idempotency keys)
//!     → Return: relayed response, duplicate ack, or RouteError
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Normalize prefixes
//!     → Sort longest prefix first
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always matches same route

pub mod dedup;
pub mod matcher;
pub mod router;

pub use matcher::{RouteMatch, RouteTable, ServiceRoute};
pub use router::{Dispatched, RouteError, WebhookRouter};
