//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler, executor, retries and the failover loop produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Operators reading logs (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Logs are the only user-visible error surface of the running loop
//! - Every round carries a round id so its log lines can be grouped
//! - Metrics are optional and cheap when no exporter is installed

pub mod logging;
pub mod metrics;
