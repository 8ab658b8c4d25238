//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize telemetry from configuration
//! - Build the probe and registry collaborators
//! - Assemble the failover loop
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::FailoverConfig;
use crate::dns::{build_registry, DnsRegistry, RegistryError};
use crate::failover::FailoverLoop;
use crate::health::{build_probe, HealthProbe, ProbeError};
use crate::observability::{logging, metrics};

/// Fatal errors raised while bringing the daemon up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("logging setup failed: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("metrics setup failed: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Install logging and, when enabled, the metrics exporter.
pub fn init_telemetry(config: &FailoverConfig) -> Result<(), StartupError> {
    logging::init_logging(&config.observability)?;

    let observability = &config.observability;
    if observability.metrics_enabled {
        let addr: SocketAddr = observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }
    Ok(())
}

/// Probe, registry and loop built from one configuration.
pub struct Components {
    pub probe: Arc<dyn HealthProbe>,
    pub registry: Arc<dyn DnsRegistry>,
    pub failover: FailoverLoop,
}

/// Build every collaborator and the loop that drives them.
pub fn build(config: &FailoverConfig) -> Result<Components, StartupError> {
    let probe = build_probe(&config.probe)?;
    let registry = build_registry(&config.dns)?;
    let failover = FailoverLoop::from_config(config, Arc::clone(&registry), Arc::clone(&probe));

    tracing::debug!(
        probe = probe.name(),
        registry = registry.name(),
        "Components initialized"
    );

    Ok(Components {
        probe,
        registry,
        failover,
    })
}
