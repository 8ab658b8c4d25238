//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the failover
//! daemon. All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the failover daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Fully-qualified names whose address records are managed.
    /// Accepts a single string or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub domains: Vec<String>,

    /// Server addresses participating in the round-robin set.
    /// Accepts a single string or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub servers: Vec<String>,

    /// Tick interval, check timeout and retry budget.
    pub schedule: ScheduleConfig,

    /// Health probe settings.
    pub probe: ProbeConfig,

    /// DNS backend settings.
    pub dns: DnsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between two rounds of checks.
    pub interval_secs: u64,

    /// Wall-clock budget of a single check attempt in seconds.
    pub timeout_secs: u64,

    /// Maximum attempts before a server is declared dead.
    pub retry: u32,

    /// Grace period granted to a timed-out check before it is aborted.
    pub kill_grace_ms: u64,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            timeout_secs: 3,
            retry: 5,
            kill_grace_ms: 500,
        }
    }
}

/// Health probe selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeConfig {
    /// HTTP(S) request with status code validation.
    Http(HttpProbeConfig),
    /// Plain TCP connect.
    Tcp(TcpProbeConfig),
    /// External program, exit status 0 means alive.
    Command(CommandProbeConfig),
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig::Http(HttpProbeConfig::default())
    }
}

/// HTTP probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpProbeConfig {
    /// Request method.
    pub method: String,

    /// Request path, including any query string.
    pub path: String,

    /// Optional request body.
    pub body: Option<String>,

    /// Extra request headers.
    pub headers: BTreeMap<String, String>,

    /// Port to connect to (default: 80, or 443 with HTTPS).
    pub port: Option<u16>,

    /// Use HTTPS instead of plain HTTP.
    pub use_https: bool,

    /// Host header to send instead of the server address.
    pub host: Option<String>,

    /// Skip certificate validation (servers are usually probed by IP).
    pub accept_invalid_certs: bool,

    /// Status codes considered healthy.
    pub valid_status_codes: Vec<u16>,
}

impl HttpProbeConfig {
    pub fn effective_port(&self) -> u16 {
        self.port
            .unwrap_or(if self.use_https { 443 } else { 80 })
    }
}

impl Default for HttpProbeConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            body: None,
            headers: BTreeMap::new(),
            port: None,
            use_https: false,
            host: None,
            accept_invalid_certs: false,
            valid_status_codes: vec![200, 302],
        }
    }
}

/// TCP probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TcpProbeConfig {
    /// Port to connect to.
    pub port: u16,
}

/// Command probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandProbeConfig {
    /// Program to execute.
    pub program: String,

    /// Arguments; `{address}` is replaced by the server address.
    #[serde(default)]
    pub args: Vec<String>,
}

/// DNS backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DnsConfig {
    /// Cloudflare v4 API.
    Cloudflare(CloudflareConfig),
    /// Process-local record store (dry runs).
    Memory(MemoryDnsConfig),
}

impl Default for DnsConfig {
    fn default() -> Self {
        DnsConfig::Memory(MemoryDnsConfig::default())
    }
}

/// Cloudflare backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudflareConfig {
    /// API token with DNS edit permission. Falls back to `CLOUDFLARE_API_TOKEN`.
    #[serde(default)]
    pub api_token: String,

    /// Zone identifier.
    pub zone_id: String,

    /// Zone name (e.g., "example.com"); every domain must belong to it.
    pub zone: String,

    /// TTL of created records in seconds. 1 = automatic.
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// API base URL.
    #[serde(default = "default_cloudflare_url")]
    pub base_url: String,

    /// Timeout of a single API request in seconds.
    #[serde(default = "default_api_timeout")]
    pub request_timeout_secs: u64,
}

fn default_ttl() -> u32 {
    1
}

fn default_cloudflare_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

/// In-memory backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MemoryDnsConfig {
    /// Initial records, keyed by domain.
    pub records: BTreeMap<String, Vec<String>>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Accept either `"a"` or `["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
