//! netheat — synthetic load generator for a networking control plane.
//!
//! Three modes:
//! - `create` floods the control plane with networks, subnets, and ports
//!   bound to this host, fanned out across a worker pool
//! - `clean` re-discovers everything this host created (by naming alone,
//!   no stored state) and tears it down the same way
//! - `discover-hosts` writes an inventory of hosts running the network agent

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use netheat::config::{self, Action, Cli, Config};
use netheat::control::{ControlPlaneClient, HttpControlPlane};
use netheat::device::{DeviceBinder, TapDeviceBinder};
use netheat::orchestrator::RunSummary;
use netheat::{discovery, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = match Config::from_cli(cli) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(config::EXIT_INVALID_CONFIG);
        }
    };

    let client: Arc<dyn ControlPlaneClient> = Arc::new(HttpControlPlane::connect(&cfg)?);
    let binder: Arc<dyn DeviceBinder> = Arc::new(TapDeviceBinder::new());

    match cfg.action {
        Action::Create => {
            tracing::info!(
                networks = cfg.networks,
                ipv4_subnets = cfg.ipv4_subnets,
                ipv6_subnets = cfg.ipv6_subnets,
                ports = cfg.ports,
                host = %cfg.hostname,
                "starting resource creation"
            );
            let summary = run::create_resources(cfg, client, binder).await;
            log_summary("resource creation finished", summary);
        }
        Action::Clean => {
            tracing::info!(host = %cfg.hostname, "starting resource cleanup");
            let summary = run::clean_all(cfg, client, binder).await;
            log_summary("resource cleanup finished", summary);
        }
        Action::DiscoverHosts => {
            tracing::info!(binary = %cfg.l2_agent_name, "discovering hosts for the inventory file");
            match discovery::discover_hosts(&cfg, client.as_ref()).await {
                Ok(hosts) => {
                    discovery::write_inventory(&hosts, &cfg.inventory_file_name)?;
                    tracing::info!(
                        hosts = hosts.len(),
                        file = %cfg.inventory_file_name.display(),
                        "inventory file ready"
                    );
                }
                Err(e @ discovery::DiscoveryError::NoAgentsFound { .. }) => {
                    tracing::error!(error = %e, "host discovery found nothing");
                    std::process::exit(config::EXIT_NO_AGENTS_FOUND);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

fn log_summary(message: &str, summary: RunSummary) {
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "{message}"
    );
}
