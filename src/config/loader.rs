//! Configuration loading from disk.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{DnsConfig, FailoverConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable consulted when the Cloudflare token is not in the file.
pub const CLOUDFLARE_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FailoverConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment fallbacks, normalize addresses and validate
/// configuration text.
pub fn parse_config(content: &str) -> Result<FailoverConfig, ConfigError> {
    let mut config: FailoverConfig = toml::from_str(content)?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    normalize_addresses(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env(config: &mut FailoverConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let DnsConfig::Cloudflare(cf) = &mut config.dns {
        if cf.api_token.trim().is_empty() {
            if let Some(token) = lookup(CLOUDFLARE_TOKEN_ENV) {
                cf.api_token = token;
            }
        }
    }
}

/// Rewrite IP literals in their canonical text form so they compare equal to
/// what a registry returns (`2001:DB8:0::1` becomes `2001:db8::1`).
/// Anything that does not parse as an IP is only trimmed.
fn normalize_addresses(config: &mut FailoverConfig) {
    for server in &mut config.servers {
        *server = canonical_address(server);
    }
    if let DnsConfig::Memory(memory) = &mut config.dns {
        for addresses in memory.records.values_mut() {
            for address in addresses.iter_mut() {
                *address = canonical_address(address);
            }
        }
    }
}

fn canonical_address(address: &str) -> String {
    let trimmed = address.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
