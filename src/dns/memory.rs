//! In-process DNS registry.
//!
//! Keeps records in memory and logs every write it receives. Used for dry runs
//! (`backend = "memory"`) and as the registry double in tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::MemoryDnsConfig;
use crate::dns::{same_address, DnsRegistry, RegistryError};

/// A write received by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryOp {
    Add { domain: String, address: String },
    Delete { domain: String, address: String },
}

#[derive(Debug, Clone)]
struct Record {
    id: String,
    address: String,
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: Mutex<BTreeMap<String, Vec<Record>>>,
    operations: Mutex<Vec<RegistryOp>>,
    next_id: AtomicU64,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `domain` with `addresses`.
    pub fn with_records<I, S>(self, domain: &str, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut records = self.lock_records();
            let entry = records.entry(normalize(domain)).or_default();
            for address in addresses {
                let id = self.allocate_id();
                entry.push(Record {
                    id,
                    address: address.into(),
                });
            }
        }
        self
    }

    pub fn from_config(config: &MemoryDnsConfig) -> Self {
        config
            .records
            .iter()
            .fold(Self::new(), |registry, (domain, addresses)| {
                registry.with_records(domain, addresses.iter().cloned())
            })
    }

    /// Current addresses of `domain`, in insertion order.
    pub fn addresses(&self, domain: &str) -> Vec<String> {
        self.lock_records()
            .get(&normalize(domain))
            .map(|records| records.iter().map(|r| r.address.clone()).collect())
            .unwrap_or_default()
    }

    /// Every write received so far.
    pub fn operations(&self) -> Vec<RegistryOp> {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn allocate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn lock_records(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Record>>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn log(&self, op: RegistryOp) {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(op);
    }
}

fn normalize(domain: &str) -> String {
    domain.trim_end_matches('.').to_ascii_lowercase()
}

#[async_trait]
impl DnsRegistry for InMemoryRegistry {
    async fn get_address_records(&self, domain: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.addresses(domain))
    }

    async fn add_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<String, RegistryError> {
        self.log(RegistryOp::Add {
            domain: domain.to_string(),
            address: address.to_string(),
        });
        let id = self.allocate_id();
        self.lock_records()
            .entry(normalize(domain))
            .or_default()
            .push(Record {
                id: id.clone(),
                address: address.to_string(),
            });
        Ok(id)
    }

    async fn delete_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<usize, RegistryError> {
        self.log(RegistryOp::Delete {
            domain: domain.to_string(),
            address: address.to_string(),
        });
        let mut records = self.lock_records();
        let Some(entry) = records.get_mut(&normalize(domain)) else {
            return Ok(0);
        };
        let before = entry.len();
        entry.retain(|record| {
            let keep = !same_address(&record.address, address);
            if !keep {
                tracing::debug!(id = %record.id, domain, address, "Removing in-memory record");
            }
            keep
        });
        Ok(before - entry.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_delete_round_trip() {
        let registry = InMemoryRegistry::new().with_records("sub.example.com", ["10.0.0.1"]);

        let id = registry
            .add_address_record("sub.example.com", "10.0.0.2")
            .await
            .unwrap();
        assert!(id.starts_with("mem-"));
        assert_eq!(
            registry.get_address_records("SUB.example.com.").await.unwrap(),
            vec!["10.0.0.1", "10.0.0.2"]
        );

        let removed = registry
            .delete_address_record("sub.example.com", "10.0.0.1")
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(registry.addresses("sub.example.com"), vec!["10.0.0.2"]);
        assert_eq!(registry.operations().len(), 2);
    }

    #[tokio::test]
    async fn delete_removes_duplicates() {
        let registry = InMemoryRegistry::new()
            .with_records("sub.example.com", ["10.0.0.1", "10.0.0.1", "10.0.0.2"]);

        let removed = registry
            .delete_address_record("sub.example.com", "10.0.0.1")
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn unknown_domain_reads_empty() {
        let registry = InMemoryRegistry::new();
        assert!(registry.get_address_records("x.example.com").await.unwrap().is_empty());
        assert_eq!(
            registry.delete_address_record("x.example.com", "10.0.0.1").await.unwrap(),
            0
        );
    }

    #[test]
    fn seeds_from_config() {
        let mut config = MemoryDnsConfig::default();
        config
            .records
            .insert("sub.example.com".into(), vec!["10.0.0.1".into()]);

        let registry = InMemoryRegistry::from_config(&config);
        assert_eq!(registry.addresses("sub.example.com"), vec!["10.0.0.1"]);
        assert!(registry.operations().is_empty());
    }
}
