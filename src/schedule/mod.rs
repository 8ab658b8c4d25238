//! Check scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! FailoverLoop
//!     → TickScheduler::next_check_time()
//!     → sleep until the returned instant
//!     → run one round of checks
//! ```
//!
//! # Design Decisions
//! - Fixed interval, fixed per-check timeout, fixed retry budget
//! - Overruns skip missed rounds instead of catching up
//! - Scheduler is owned by the loop; no global clock state

pub mod tick;

pub use tick::TickScheduler;
