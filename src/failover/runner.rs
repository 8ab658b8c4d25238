//! The failover control loop.
//!
//! # Responsibilities
//! - Wait for the next scheduled round
//! - Run one reconciliation pass per domain, in configured order
//! - Stop cleanly on shutdown
//!
//! # Design Decisions
//! - Strictly sequential: domains one at a time, servers one at a time
//! - A round in progress is not interrupted; shutdown is observed between
//!   rounds and between domains
//! - Nothing that happens inside a round can terminate the loop

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::{self, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::FailoverConfig;
use crate::dns::DnsRegistry;
use crate::failover::reconcile::{DomainReport, Reconciler};
use crate::health::HealthProbe;
use crate::observability::metrics;
use crate::resilience::{BoundedExecutor, RetryPolicy};
use crate::schedule::TickScheduler;

/// Keeps the records of every domain in sync with server health.
pub struct FailoverLoop {
    domains: Vec<String>,
    servers: Vec<String>,
    registry: Arc<dyn DnsRegistry>,
    probe: Arc<dyn HealthProbe>,
    scheduler: TickScheduler,
    retry: RetryPolicy,
}

impl FailoverLoop {
    pub fn new(
        domains: Vec<String>,
        servers: Vec<String>,
        registry: Arc<dyn DnsRegistry>,
        probe: Arc<dyn HealthProbe>,
        scheduler: TickScheduler,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            domains,
            servers,
            registry,
            probe,
            scheduler,
            retry,
        }
    }

    /// Assemble a loop from validated configuration and built collaborators.
    pub fn from_config(
        config: &FailoverConfig,
        registry: Arc<dyn DnsRegistry>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self::new(
            config.domains.clone(),
            config.servers.clone(),
            registry,
            probe,
            TickScheduler::from_config(&config.schedule),
            RetryPolicy::new(BoundedExecutor::new(config.schedule.kill_grace())),
        )
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Run until a shutdown signal is received.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            domains = ?self.domains,
            servers = ?self.servers,
            registry = self.registry.name(),
            probe = self.probe.name(),
            interval_secs = self.scheduler.interval().as_secs(),
            "DNS failover starting"
        );

        loop {
            let next = self.scheduler.next_check_time();
            let wait = next.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                tracing::info!(
                    wait_secs = wait.as_secs_f64(),
                    "Waiting before next round of checks"
                );
            }

            tokio::select! {
                _ = time::sleep_until(next) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Failover loop received shutdown signal, exiting loop");
                    break;
                }
            }

            if self.run_round(Some(&mut shutdown)).await.is_none() {
                tracing::info!("Failover loop received shutdown signal during round, exiting loop");
                break;
            }
        }
    }

    /// Run a single round over every domain right away.
    pub async fn run_once(&self) -> Vec<DomainReport> {
        self.run_round(None).await.unwrap_or_default()
    }

    /// Returns `None` if shutdown was requested between two domains.
    async fn run_round(
        &self,
        mut shutdown: Option<&mut broadcast::Receiver<()>>,
    ) -> Option<Vec<DomainReport>> {
        let span = tracing::info_span!("round", id = %Uuid::new_v4());
        async move {
            let started = Instant::now();
            let reconciler = Reconciler {
                registry: &self.registry,
                probe: &self.probe,
                retry: &self.retry,
                timer: &self.scheduler,
            };

            let mut reports = Vec::with_capacity(self.domains.len());
            for domain in &self.domains {
                if let Some(rx) = shutdown.as_deref_mut() {
                    if !matches!(rx.try_recv(), Err(TryRecvError::Empty)) {
                        return None;
                    }
                }
                reports.push(reconciler.reconcile_domain(domain, &self.servers).await);
            }

            let elapsed = started.elapsed();
            metrics::record_tick(elapsed);
            tracing::debug!(
                elapsed_secs = elapsed.as_secs_f64(),
                mutations = reports.iter().map(DomainReport::mutations).sum::<usize>(),
                "Round complete"
            );
            Some(reports)
        }
        .instrument(span)
        .await
    }
}
