//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Telemetry → Probe + Registry → FailoverLoop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Finish current domain → Exit loop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then telemetry, then collaborators
//! - A check in flight is bounded by its timeout, so shutdown is prompt

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
