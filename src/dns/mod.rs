//! DNS registry subsystem.
//!
//! # Data Flow
//! ```text
//! FailoverLoop
//!     → DnsRegistry::get_address_records(domain)    snapshot at domain start
//!     → DnsRegistry::add_address_record(...)        healthy but missing
//!     → DnsRegistry::delete_address_record(...)     dead and published
//!
//! Backends:
//!     cloudflare.rs  Cloudflare v4 REST API
//!     memory.rs      in-process store (dry runs, tests)
//! ```
//!
//! # Design Decisions
//! - The loop treats every registry error opaquely: log and move on
//! - Record type (A/AAAA) is a backend concern, the core only sees addresses
//! - No locking across read-decide-write; concurrent edits are tolerated

pub mod cloudflare;
pub mod memory;

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DnsConfig;

pub use cloudflare::CloudflareRegistry;
pub use memory::InMemoryRegistry;

/// Errors returned by a DNS backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error envelope.
    #[error("API error: {0}")]
    Api(String),

    /// The address cannot be published as an address record.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// The backend could not be constructed.
    #[error("registry setup failed: {0}")]
    Setup(String),
}

/// Address record store for a set of domains.
#[async_trait]
pub trait DnsRegistry: Send + Sync {
    /// Addresses currently published for `domain`.
    async fn get_address_records(&self, domain: &str) -> Result<Vec<String>, RegistryError>;

    /// Publish `address` for `domain`, returning the new record identifier.
    async fn add_address_record(&self, domain: &str, address: &str)
        -> Result<String, RegistryError>;

    /// Remove every record of `domain` pointing at `address`, returning how
    /// many were removed.
    async fn delete_address_record(&self, domain: &str, address: &str)
        -> Result<usize, RegistryError>;

    /// Short backend name for log lines.
    fn name(&self) -> &str;
}

/// Compare two record addresses. IP literals are compared by value, so
/// `2001:DB8:0::1` and `2001:db8::1` are the same address.
pub fn same_address(a: &str, b: &str) -> bool {
    match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Build the configured registry backend.
pub fn build_registry(config: &DnsConfig) -> Result<Arc<dyn DnsRegistry>, RegistryError> {
    Ok(match config {
        DnsConfig::Cloudflare(cf) => Arc::new(CloudflareRegistry::new(cf.clone())?),
        DnsConfig::Memory(memory) => Arc::new(InMemoryRegistry::from_config(memory)),
    })
}
