//! Failover subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs (FailoverLoop)
//!     → TickScheduler: wait for next round
//!     → for each domain:
//!         reconcile.rs
//!             → DnsRegistry: read record snapshot
//!             → for each server: RetryPolicy → BoundedExecutor → HealthProbe
//!             → DnsRegistry: add / delete
//! ```
//!
//! # Design Decisions
//! - Never remove the last published address of a domain
//! - At most one removal per domain per round
//! - No state survives between rounds except the schedule

pub mod reconcile;
pub mod runner;

pub use reconcile::{DomainReport, Reconciler};
pub use runner::FailoverLoop;
