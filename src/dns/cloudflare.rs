//! Cloudflare DNS backend.
//!
//! # Responsibilities
//! - List A/AAAA records of a name (all pages)
//! - Create one record per address, type chosen from the address family
//! - Delete every record of a name targeting an address
//!
//! # Design Decisions
//! - v4 REST API with bearer token authentication
//! - A `success: false` envelope is an error carrying the API messages
//! - Created records are never proxied; the point is to publish origin IPs

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::CloudflareConfig;
use crate::dns::{same_address, DnsRegistry, RegistryError};

const PAGE_SIZE: u32 = 100;

/// API response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

/// Registry backed by one Cloudflare zone.
pub struct CloudflareRegistry {
    client: Client,
    records_url: String,
    ttl: u32,
}

impl CloudflareRegistry {
    pub fn new(config: CloudflareConfig) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|e| RegistryError::Setup(format!("api token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RegistryError::Setup(e.to_string()))?;

        let records_url = format!(
            "{}/zones/{}/dns_records",
            config.base_url.trim_end_matches('/'),
            config.zone_id
        );

        tracing::debug!(zone = %config.zone, ttl = config.ttl, "Cloudflare registry configured");

        Ok(Self {
            client,
            records_url,
            ttl: config.ttl,
        })
    }

    /// All A/AAAA records for `domain`, across every result page.
    pub async fn address_records(&self, domain: &str) -> Result<Vec<DnsRecord>, RegistryError> {
        let name = domain.trim_end_matches('.');
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let request = self.client.get(&self.records_url).query(&[
                ("name", name.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ]);
            let envelope: Envelope<Vec<DnsRecord>> = send(request).await?;
            let info = envelope.result_info;
            let batch = unwrap_result(envelope.success, envelope.errors, envelope.result)?;

            records.extend(
                batch
                    .into_iter()
                    .filter(|r| r.record_type == "A" || r.record_type == "AAAA")
                    .filter(|r| r.name.eq_ignore_ascii_case(name)),
            );

            match info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }

        Ok(records)
    }
}

/// Record type for an address: AAAA for IPv6, A otherwise.
pub fn record_type_for(address: &str) -> Result<&'static str, RegistryError> {
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => Ok("A"),
        Ok(IpAddr::V6(_)) => Ok("AAAA"),
        Err(_) => Err(RegistryError::InvalidAddress(address.to_string())),
    }
}

async fn send<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<Envelope<T>, RegistryError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    match serde_json::from_slice::<Envelope<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(e) if status.is_success() => {
            Err(RegistryError::Api(format!("malformed response: {e}")))
        }
        Err(_) => Err(RegistryError::Api(format!("HTTP {status}"))),
    }
}

fn unwrap_result<T>(
    success: bool,
    errors: Vec<ApiMessage>,
    result: Option<T>,
) -> Result<T, RegistryError> {
    if !success {
        let message = if errors.is_empty() {
            "request was not successful".to_string()
        } else {
            errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ")
        };
        return Err(RegistryError::Api(message));
    }
    result.ok_or_else(|| RegistryError::Api("response has no result".to_string()))
}

#[async_trait]
impl DnsRegistry for CloudflareRegistry {
    async fn get_address_records(&self, domain: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self
            .address_records(domain)
            .await?
            .into_iter()
            .map(|r| r.content)
            .collect())
    }

    async fn add_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<String, RegistryError> {
        let record = NewRecord {
            record_type: record_type_for(address)?,
            name: domain.trim_end_matches('.'),
            content: address,
            ttl: self.ttl,
            proxied: false,
        };
        let envelope: Envelope<DnsRecord> =
            send(self.client.post(&self.records_url).json(&record)).await?;
        let created = unwrap_result(envelope.success, envelope.errors, envelope.result)?;

        tracing::debug!(id = %created.id, domain, address, "Cloudflare record created");
        Ok(created.id)
    }

    async fn delete_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<usize, RegistryError> {
        let mut deleted = 0;
        for record in self.address_records(domain).await? {
            if !same_address(&record.content, address) {
                continue;
            }
            let url = format!("{}/{}", self.records_url, record.id);
            let envelope: Envelope<serde_json::Value> = send(self.client.delete(&url)).await?;
            unwrap_result(envelope.success, envelope.errors, envelope.result)?;

            tracing::debug!(id = %record.id, domain, address, "Cloudflare record deleted");
            deleted += 1;
        }
        Ok(deleted)
    }

    fn name(&self) -> &str {
        "cloudflare"
    }
}
