//! Host discovery — list agent hosts and write an inventory file.
//!
//! Finding zero matching agents is a dedicated failure: the caller exits
//! with its own status code and no inventory file is written, so automation
//! driving this tool can tell "nothing out there" apart from a bad run.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use netheat_common::error::ClientError;

use crate::config::Config;
use crate::control::ControlPlaneClient;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no alive agents running {binary} were found")]
    NoAgentsFound { binary: String },
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to write inventory file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize inventory: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Hosts running the configured agent binary, in listing order.
///
/// The control plane's agent listing already excludes non-alive agents, so
/// an empty result means no such agent exists anywhere right now.
pub async fn discover_hosts(
    cfg: &Config,
    client: &dyn ControlPlaneClient,
) -> Result<Vec<String>, DiscoveryError> {
    let agents = client.list_agents().await?;
    let hosts: Vec<String> = agents
        .into_iter()
        .filter(|a| a.binary == cfg.l2_agent_name)
        .map(|a| a.host)
        .collect();
    if hosts.is_empty() {
        return Err(DiscoveryError::NoAgentsFound {
            binary: cfg.l2_agent_name.clone(),
        });
    }
    info!(hosts = hosts.len(), binary = %cfg.l2_agent_name, "agents discovered");
    Ok(hosts)
}

/// Write the host list; a `.yaml`/`.yml` suffix selects the ansible YAML
/// inventory shape, anything else gets one host per line.
pub fn write_inventory(hosts: &[String], path: &Path) -> Result<(), DiscoveryError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => write_yaml_inventory(hosts, path),
        _ => write_plain_inventory(hosts, path),
    }
}

/// `all: { hosts: { <host>: null, ... } }` — the ansible inventory shape.
fn write_yaml_inventory(hosts: &[String], path: &Path) -> Result<(), DiscoveryError> {
    use serde_yaml::{Mapping, Value};

    let mut host_map = Mapping::new();
    for host in hosts {
        host_map.insert(Value::String(host.clone()), Value::Null);
    }
    let mut all = Mapping::new();
    all.insert(
        Value::String("hosts".into()),
        Value::Mapping(host_map),
    );
    let mut root = Mapping::new();
    root.insert(Value::String("all".into()), Value::Mapping(all));

    let content = serde_yaml::to_string(&Value::Mapping(root))?;
    std::fs::write(path, content)?;
    Ok(())
}

fn write_plain_inventory(hosts: &[String], path: &Path) -> Result<(), DiscoveryError> {
    let mut content = hosts.join("\n");
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
