//! TCP connect probe.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::health::{host_port, HealthProbe, ProbeError};

/// Considers a server alive when a TCP connection can be established.
pub struct TcpProbe {
    port: u16,
    name: String,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            name: format!("tcp(*:{port})"),
        }
    }
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn check(&self, address: &str) -> Result<bool, ProbeError> {
        match TcpStream::connect(host_port(address, self.port)).await {
            Ok(_stream) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                tracing::debug!(address, port = self.port, "connection refused");
                Ok(false)
            }
            Err(e) => Err(ProbeError::Io(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_passes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new(port);
        assert!(probe.check("127.0.0.1").await.unwrap());
    }

    #[tokio::test]
    async fn closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TcpProbe::new(port);
        assert!(!probe.check("127.0.0.1").await.unwrap());
    }
}
