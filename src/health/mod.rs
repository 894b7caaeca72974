//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive tracking (tracker.rs):
//!     Forward outcome reported by the router
//!     → success: reset failures, count request
//!     → failure: increment failures / trip immediately
//!     → Update state.rs
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - No active probing; traffic is the only health signal
//! - Health state is per-backend, not per-service
//! - Administrative reset restores every backend at once

pub mod state;
pub mod tracker;

pub use state::{BackendHealth, HealthState};
pub use tracker::HealthTracker;
