//! dns-failover binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use dns_failover::config::{load_config, FailoverConfig};
use dns_failover::lifecycle::{signals, startup, Shutdown};
use dns_failover::resilience::{BoundedExecutor, RetryPolicy};

/// Keeps round-robin DNS records in sync with the health of a server pool.
#[derive(Parser, Debug)]
#[command(name = "dns-failover")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(short, long, default_value = "dns-failover.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the failover loop until interrupted (default)
    Run,
    /// Run a single reconciliation round now and print the reports
    Once,
    /// Check every server once and print its health
    Check,
    /// Print the current records of every domain
    Records,
    /// Validate the configuration and exit
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::Validate = command {
        print_summary(&config);
        return Ok(());
    }

    startup::init_telemetry(&config)?;
    tracing::info!(
        config_file = %cli.config.display(),
        domains = config.domains.len(),
        servers = config.servers.len(),
        "Configuration loaded"
    );

    let components = startup::build(&config)?;

    match command {
        Commands::Run => {
            let shutdown = Arc::new(Shutdown::new());
            let receiver = shutdown.subscribe();
            signals::spawn_signal_handler(Arc::clone(&shutdown));

            components.failover.run(receiver).await;
            tracing::info!("Shutdown complete");
        }
        Commands::Once => {
            let reports = components.failover.run_once().await;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Check => {
            let retry = RetryPolicy::new(BoundedExecutor::new(config.schedule.kill_grace()));
            let timer = components.failover.scheduler();
            let mut results = serde_json::Map::new();
            for server in &config.servers {
                let healthy = retry.evaluate(server, &components.probe, timer).await;
                results.insert(server.clone(), json!(healthy));
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Records => {
            let mut results = serde_json::Map::new();
            for domain in &config.domains {
                let value = match components.registry.get_address_records(domain).await {
                    Ok(records) => json!(records),
                    Err(e) => json!({ "error": e.to_string() }),
                };
                results.insert(domain.clone(), value);
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Validate => print_summary(&config),
    }

    Ok(())
}

fn print_summary(config: &FailoverConfig) {
    println!("Configuration is valid");
    println!("  domains:  {}", config.domains.join(", "));
    println!("  servers:  {}", config.servers.join(", "));
    println!(
        "  schedule: every {}s, {}s per check, {} attempt(s)",
        config.schedule.interval_secs, config.schedule.timeout_secs, config.schedule.retry
    );
}
