//! Round-robin DNS failover.
//!
//! Keeps the address records of one or more domains in sync with the health
//! of a pool of servers: dead servers are removed, recovered servers are added
//! back, and the last record of a domain is never removed.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────┐   next round    ┌──────────────────────────────────────┐
//!   │ TickScheduler│────────────────▶│            FailoverLoop              │
//!   └──────────────┘                 │                                      │
//!                                    │  per domain:                         │
//!   ┌──────────────┐  read / write   │    snapshot records                  │
//!   │ DnsRegistry  │◀───────────────▶│    per server: RetryPolicy           │
//!   │ (cloudflare, │                 │      → BoundedExecutor → HealthProbe │
//!   │  memory)     │                 │    add / delete (max one delete)     │
//!   └──────────────┘                 └──────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod dns;
pub mod failover;
pub mod health;
pub mod schedule;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::FailoverConfig;
pub use failover::{DomainReport, FailoverLoop};
pub use lifecycle::Shutdown;
