//! Reconciliation of one domain against observed server health.
//!
//! # Decision Table
//! ```text
//! healthy,   published  → keep
//! healthy,   missing    → add (failure logged, next server)
//! unhealthy, missing    → nothing to do
//! unhealthy, published  → fewer than 2 records: keep (never empty the set)
//!                         otherwise: delete, then stop this domain for the tick
//! ```
//!
//! # Design Decisions
//! - Records are read once per domain per tick; decisions use that snapshot
//! - At most one deletion per domain per tick to avoid flapping several records
//! - Every registry error is local to one server or one domain

use std::sync::Arc;

use serde::Serialize;

use crate::dns::{same_address, DnsRegistry};
use crate::health::HealthProbe;
use crate::observability::metrics::{self, RecordChange};
use crate::resilience::RetryPolicy;
use crate::schedule::TickScheduler;

/// Outcome of one reconciliation pass over a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    pub domain: String,
    /// Records as read at the start of the pass; empty if the read failed.
    pub records: Vec<String>,
    /// The record read failed and the domain was skipped.
    pub skipped: bool,
    pub healthy: Vec<String>,
    pub unhealthy: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Dead servers left published because they were the last record.
    pub retained: Vec<String>,
    /// Failed add/delete calls.
    pub write_errors: usize,
}

impl DomainReport {
    fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    pub fn mutations(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Everything one domain pass needs, borrowed from the loop.
pub struct Reconciler<'a> {
    pub registry: &'a Arc<dyn DnsRegistry>,
    pub probe: &'a Arc<dyn HealthProbe>,
    pub retry: &'a RetryPolicy,
    pub timer: &'a TickScheduler,
}

impl Reconciler<'_> {
    /// Converge the records of `domain` towards the health of `servers`.
    pub async fn reconcile_domain(&self, domain: &str, servers: &[String]) -> DomainReport {
        let mut report = DomainReport::new(domain);

        tracing::debug!(domain, "Getting DNS records");
        let records = match self.registry.get_address_records(domain).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(domain, error = %e, "Error while retrieving DNS records");
                metrics::record_read_error(domain);
                report.skipped = true;
                return report;
            }
        };
        tracing::debug!(domain, records = ?records, "Current DNS records");
        metrics::record_record_count(domain, records.len());
        report.records = records.clone();

        tracing::debug!(domain, servers = servers.len(), "Checking servers");
        for server in servers {
            let healthy = self.retry.evaluate(server, self.probe, self.timer).await;
            metrics::record_server_health(server, healthy);
            let published = records.iter().any(|r| same_address(r, server));

            if healthy {
                report.healthy.push(server.clone());
                if published {
                    tracing::info!(
                        domain,
                        server = %server,
                        "Server seems alive and is on the DNS"
                    );
                } else {
                    self.add(domain, server, &mut report).await;
                }
                continue;
            }

            report.unhealthy.push(server.clone());
            if !published {
                tracing::info!(domain, server = %server, "Server continues dead");
                continue;
            }

            if records.len() < 2 {
                tracing::error!(
                    domain,
                    server = %server,
                    "Server seems dead but is the last DNS record, not removing it"
                );
                report.retained.push(server.clone());
                continue;
            }

            if self.delete(domain, server, &mut report).await {
                // Only remove one server per domain per tick.
                break;
            }
        }

        report
    }

    async fn add(&self, domain: &str, server: &str, report: &mut DomainReport) {
        tracing::warn!(
            domain,
            server,
            "Server seems alive and is not on a DNS record, adding it"
        );
        match self.registry.add_address_record(domain, server).await {
            Ok(id) => {
                tracing::info!(domain, server, record_id = %id, "Record added to the DNS");
                metrics::record_change(domain, RecordChange::Add, true);
                report.added.push(server.to_string());
            }
            Err(e) => {
                tracing::error!(domain, server, error = %e, "Error while adding record");
                metrics::record_change(domain, RecordChange::Add, false);
                report.write_errors += 1;
            }
        }
    }

    /// Returns `true` when the delete call went through.
    async fn delete(&self, domain: &str, server: &str, report: &mut DomainReport) -> bool {
        tracing::error!(
            domain,
            server,
            "Server seems dead and is on a DNS record, removing it"
        );
        match self.registry.delete_address_record(domain, server).await {
            Ok(count) => {
                tracing::info!(
                    domain,
                    server,
                    count,
                    "Records targeting server were removed from the DNS"
                );
                metrics::record_change(domain, RecordChange::Delete, true);
                report.removed.push(server.to_string());
                true
            }
            Err(e) => {
                tracing::error!(domain, server, error = %e, "Error while deleting record");
                metrics::record_change(domain, RecordChange::Delete, false);
                report.write_errors += 1;
                false
            }
        }
    }
}
