//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend:
//!     → timeouts.rs (overall budget, per-attempt deadline)
//!     → On transient failure: retries.rs (retry once if budget allows)
//!     → Outcome reported to the health tracker by the router
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Retries are bounded by attempts and by the remaining budget

pub mod retries;
pub mod timeouts;

pub use retries::RetryPolicy;
pub use timeouts::TimeBudget;
