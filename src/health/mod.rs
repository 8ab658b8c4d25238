//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! RetryPolicy (resilience/retries.rs)
//!     → BoundedExecutor (resilience/timeouts.rs)
//!     → HealthProbe::check(address)
//!         http.rs     status code validation
//!         tcp.rs      connect only
//!         command.rs  external program, exit status
//! ```
//!
//! # Design Decisions
//! - Probes do not enforce deadlines themselves; the executor does
//! - A probe error is a fault, distinct from a clean "not alive" answer
//! - Probes are shared behind `Arc` so each attempt can run on its own task

pub mod command;
pub mod http;
pub mod tcp;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ProbeConfig;

pub use command::CommandProbe;
pub use http::HttpProbe;
pub use tcp::TcpProbe;

/// Errors raised by a probe that could not produce an answer.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe request failed at the transport level.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Socket or process IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The checked program was terminated by a signal.
    #[error("check process terminated by signal")]
    Killed,

    /// Failed to construct the probe from configuration.
    #[error("probe setup failed: {0}")]
    Setup(String),
}

/// One liveness check against a server address.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Check a single address. `Ok(false)` is a clean failure.
    async fn check(&self, address: &str) -> Result<bool, ProbeError>;

    /// Short description for log lines.
    fn name(&self) -> &str;
}

/// Result of one bounded probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The probe reported the server alive.
    Passed,
    /// The probe reported the server dead, or timed out.
    Failed,
    /// The probe raised a fault or panicked.
    Errored,
}

impl CheckOutcome {
    pub fn is_pass(self) -> bool {
        self == CheckOutcome::Passed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckOutcome::Passed => "passed",
            CheckOutcome::Failed => "failed",
            CheckOutcome::Errored => "errored",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the configured probe.
pub fn build_probe(config: &ProbeConfig) -> Result<Arc<dyn HealthProbe>, ProbeError> {
    Ok(match config {
        ProbeConfig::Http(http) => Arc::new(HttpProbe::new(http.clone())?),
        ProbeConfig::Tcp(tcp) => Arc::new(TcpProbe::new(tcp.port)),
        ProbeConfig::Command(command) => Arc::new(CommandProbe::new(command.clone())),
    })
}

/// Join an address and a port, bracketing bare IPv6 literals.
pub(crate) fn host_port(address: &str, port: u16) -> String {
    if address.parse::<std::net::Ipv6Addr>().is_ok() {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}
