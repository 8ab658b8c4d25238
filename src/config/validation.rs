//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval, timeout and retry > 0)
//! - Check that every managed domain is served by the configured backend
//! - Detect duplicate servers and domains
//! - Servers published through Cloudflare must be IP literals
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FailoverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::{DnsConfig, FailoverConfig, ProbeConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one domain must be configured")]
    NoDomains,

    #[error("at least one server must be configured")]
    NoServers,

    #[error("duplicate {kind} '{value}'")]
    Duplicate { kind: &'static str, value: String },

    #[error("empty {0} entry")]
    Empty(&'static str),

    #[error("schedule.{0} must be greater than zero")]
    Zero(&'static str),

    #[error("probe: {0}")]
    Probe(String),

    #[error("dns: {0}")]
    Dns(String),

    #[error("server '{0}' is not an IP address (required by the cloudflare backend)")]
    NotAnAddress(String),

    #[error("domain '{domain}' is not inside zone '{zone}'")]
    OutsideZone { domain: String, zone: String },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &FailoverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.domains.is_empty() {
        errors.push(ValidationError::NoDomains);
    }
    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
    }
    check_entries("domain", &config.domains, &mut errors);
    check_entries("server", &config.servers, &mut errors);

    if config.schedule.interval_secs == 0 {
        errors.push(ValidationError::Zero("interval_secs"));
    }
    if config.schedule.timeout_secs == 0 {
        errors.push(ValidationError::Zero("timeout_secs"));
    }
    if config.schedule.retry == 0 {
        errors.push(ValidationError::Zero("retry"));
    }

    validate_probe(&config.probe, &mut errors);
    validate_dns(config, &mut errors);

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_entries(kind: &'static str, values: &[String], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for value in values {
        let normalized = value.trim().trim_end_matches('.').to_ascii_lowercase();
        if normalized.is_empty() {
            errors.push(ValidationError::Empty(kind));
        } else if !seen.insert(normalized) {
            errors.push(ValidationError::Duplicate {
                kind,
                value: value.clone(),
            });
        }
    }
}

fn validate_probe(probe: &ProbeConfig, errors: &mut Vec<ValidationError>) {
    match probe {
        ProbeConfig::Http(http) => {
            if http.valid_status_codes.is_empty() {
                errors.push(ValidationError::Probe(
                    "valid_status_codes must not be empty".to_string(),
                ));
            }
            for code in &http.valid_status_codes {
                if !(100..=599).contains(code) {
                    errors.push(ValidationError::Probe(format!(
                        "status code {code} is out of range"
                    )));
                }
            }
            if reqwest::Method::from_bytes(http.method.as_bytes()).is_err() {
                errors.push(ValidationError::Probe(format!(
                    "invalid HTTP method '{}'",
                    http.method
                )));
            }
            if !http.path.starts_with('/') {
                errors.push(ValidationError::Probe(format!(
                    "path '{}' must start with '/'",
                    http.path
                )));
            }
        }
        ProbeConfig::Tcp(tcp) => {
            if tcp.port == 0 {
                errors.push(ValidationError::Probe("tcp port must not be 0".to_string()));
            }
        }
        ProbeConfig::Command(command) => {
            if command.program.trim().is_empty() {
                errors.push(ValidationError::Probe(
                    "command program must not be empty".to_string(),
                ));
            }
        }
    }
}

fn validate_dns(config: &FailoverConfig, errors: &mut Vec<ValidationError>) {
    let DnsConfig::Cloudflare(cf) = &config.dns else {
        return;
    };

    if cf.api_token.trim().is_empty() {
        errors.push(ValidationError::Dns(
            "cloudflare api_token is empty (set it or CLOUDFLARE_API_TOKEN)".to_string(),
        ));
    }
    if cf.zone_id.trim().is_empty() {
        errors.push(ValidationError::Dns("cloudflare zone_id is empty".to_string()));
    }
    if url::Url::parse(&cf.base_url).is_err() {
        errors.push(ValidationError::Dns(format!(
            "invalid cloudflare base_url '{}'",
            cf.base_url
        )));
    }
    if cf.ttl != 1 && cf.ttl < 60 {
        errors.push(ValidationError::Dns(format!(
            "ttl {} is too low (1 = automatic, otherwise at least 60)",
            cf.ttl
        )));
    }

    for server in &config.servers {
        if server.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::NotAnAddress(server.clone()));
        }
    }

    let zone = cf.zone.trim_end_matches('.').to_ascii_lowercase();
    for domain in &config.domains {
        let name = domain.trim_end_matches('.').to_ascii_lowercase();
        if name != zone && !name.ends_with(&format!(".{zone}")) {
            errors.push(ValidationError::OutsideZone {
                domain: domain.clone(),
                zone: cf.zone.clone(),
            });
        }
    }
}
