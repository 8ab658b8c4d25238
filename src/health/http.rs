//! HTTP health probe.
//!
//! Issues one request against the server and checks the status code against
//! the configured list. Redirects are not followed so `302` can be accepted as
//! a sign of life.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, HOST, USER_AGENT};
use reqwest::{redirect, Client, Method};

use crate::config::HttpProbeConfig;
use crate::health::{host_port, HealthProbe, ProbeError};

pub struct HttpProbe {
    client: Client,
    method: Method,
    headers: HeaderMap,
    config: HttpProbeConfig,
    name: String,
}

impl HttpProbe {
    pub fn new(config: HttpProbeConfig) -> Result<Self, ProbeError> {
        let method = Method::from_bytes(config.method.as_bytes())
            .map_err(|e| ProbeError::Setup(format!("method '{}': {e}", config.method)))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("dns-failover-health-check"));
        if let Some(host) = &config.host {
            let value = HeaderValue::from_str(host)
                .map_err(|e| ProbeError::Setup(format!("host header: {e}")))?;
            headers.insert(HOST, value);
        }
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProbeError::Setup(format!("header '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProbeError::Setup(format!("header value: {e}")))?;
            headers.insert(name, value);
        }

        // Connections are never reused: each check must reach the server fresh.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(|e| ProbeError::Setup(e.to_string()))?;

        let scheme = if config.use_https { "https" } else { "http" };
        let name = format!(
            "http({} {}://*:{}{})",
            method,
            scheme,
            config.effective_port(),
            config.path
        );

        Ok(Self {
            client,
            method,
            headers,
            config,
            name,
        })
    }

    fn url(&self, address: &str) -> String {
        let scheme = if self.config.use_https { "https" } else { "http" };
        format!(
            "{}://{}{}",
            scheme,
            host_port(address, self.config.effective_port()),
            self.config.path
        )
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self, address: &str) -> Result<bool, ProbeError> {
        let url = self.url(address);
        let mut request = self
            .client
            .request(self.method.clone(), &url)
            .headers(self.headers.clone());
        if let Some(body) = &self.config.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let healthy = self.config.valid_status_codes.contains(&status);
        if !healthy {
            tracing::debug!(%url, status, "health check returned unexpected status");
        }
        Ok(healthy)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
