//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env fallbacks)
//!     → validation.rs (semantic checks)
//!     → FailoverConfig (validated, immutable)
//!     → handed to the failover loop at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; domains and servers never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Single-string-or-list inputs are normalized here, the core only sees lists
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::FailoverConfig;
pub use schema::{
    CloudflareConfig, CommandProbeConfig, DnsConfig, HttpProbeConfig, LogFormat,
    MemoryDnsConfig, ObservabilityConfig, ProbeConfig, ScheduleConfig, TcpProbeConfig,
};
pub use validation::ValidationError;
