//! External command probe.
//!
//! Runs a program per check in its own process. Exit status 0 means the server
//! is alive, any other exit code means it is not. The child is killed if the
//! check is cancelled, so a hung program never outlives its deadline.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::CommandProbeConfig;
use crate::health::{HealthProbe, ProbeError};

const ADDRESS_PLACEHOLDER: &str = "{address}";

pub struct CommandProbe {
    config: CommandProbeConfig,
    name: String,
}

impl CommandProbe {
    pub fn new(config: CommandProbeConfig) -> Self {
        let name = format!("command({})", config.program);
        Self { config, name }
    }

    fn args_for(&self, address: &str) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| arg.replace(ADDRESS_PLACEHOLDER, address))
            .collect()
    }
}

#[async_trait]
impl HealthProbe for CommandProbe {
    async fn check(&self, address: &str) -> Result<bool, ProbeError> {
        let status = Command::new(&self.config.program)
            .args(self.args_for(address))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        match status.code() {
            Some(0) => Ok(true),
            Some(code) => {
                tracing::debug!(
                    address,
                    code,
                    program = %self.config.program,
                    "check program failed"
                );
                Ok(false)
            }
            None => Err(ProbeError::Killed),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
