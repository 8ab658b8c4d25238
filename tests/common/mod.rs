//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use dns_failover::dns::{DnsRegistry, InMemoryRegistry, RegistryError};
use dns_failover::failover::FailoverLoop;
use dns_failover::health::{HealthProbe, ProbeError};
use dns_failover::resilience::{BoundedExecutor, RetryPolicy};
use dns_failover::schedule::TickScheduler;

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` is called once per connection and returns the status line code and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            302 => "302 Found",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Probe whose answers are set per address by the test.
#[derive(Default)]
pub struct ScriptedProbe {
    alive: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedProbe {
    pub fn new<'a>(alive: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
        let probe = Self::default();
        probe.set_alive(alive);
        Arc::new(probe)
    }

    pub fn set_alive<'a>(&self, alive: impl IntoIterator<Item = &'a str>) {
        let mut set = self.alive.lock().unwrap();
        set.clear();
        set.extend(alive.into_iter().map(str::to_string));
    }

    pub fn calls(&self, address: &str) -> usize {
        self.calls.lock().unwrap().get(address).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn check(&self, address: &str) -> Result<bool, ProbeError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default() += 1;
        Ok(self.alive.lock().unwrap().contains(address))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Wraps an in-memory registry and fails selected operations.
pub struct FaultyRegistry {
    pub inner: InMemoryRegistry,
    pub fail_reads: HashSet<String>,
    pub fail_adds: HashSet<String>,
    pub fail_deletes: HashSet<String>,
    pub attempted_writes: AtomicUsize,
}

impl FaultyRegistry {
    pub fn new(inner: InMemoryRegistry) -> Self {
        Self {
            inner,
            fail_reads: HashSet::new(),
            fail_adds: HashSet::new(),
            fail_deletes: HashSet::new(),
            attempted_writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DnsRegistry for FaultyRegistry {
    async fn get_address_records(&self, domain: &str) -> Result<Vec<String>, RegistryError> {
        if self.fail_reads.contains(domain) {
            return Err(RegistryError::Api("read refused".into()));
        }
        self.inner.get_address_records(domain).await
    }

    async fn add_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<String, RegistryError> {
        self.attempted_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_adds.contains(address) {
            return Err(RegistryError::Api("add refused".into()));
        }
        self.inner.add_address_record(domain, address).await
    }

    async fn delete_address_record(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<usize, RegistryError> {
        self.attempted_writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.contains(address) {
            return Err(RegistryError::Api("delete refused".into()));
        }
        self.inner.delete_address_record(domain, address).await
    }

    fn name(&self) -> &str {
        "faulty"
    }
}

/// Build a loop over `domains` and `servers` with the given retry budget.
pub fn failover_loop(
    domains: &[&str],
    servers: &[&str],
    registry: Arc<dyn DnsRegistry>,
    probe: Arc<dyn HealthProbe>,
    retry: u32,
) -> FailoverLoop {
    FailoverLoop::new(
        domains.iter().map(|d| d.to_string()).collect(),
        servers.iter().map(|s| s.to_string()).collect(),
        registry,
        probe,
        TickScheduler::new(Duration::from_secs(300), Duration::from_secs(3), retry),
        RetryPolicy::new(BoundedExecutor::new(Duration::from_millis(100))),
    )
}
