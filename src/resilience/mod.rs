//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Server health evaluation:
//!     → retries.rs (re-attempt until pass or budget spent)
//!     → timeouts.rs (one attempt, hard deadline, forced termination)
//!     → HealthProbe
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every probe attempt has a deadline
//! - A hung or crashing probe degrades to a failed check, never a stuck loop
//! - Retries are immediate; the tick interval is the only pacing

pub mod retries;
pub mod timeouts;

pub use retries::RetryPolicy;
pub use timeouts::BoundedExecutor;
