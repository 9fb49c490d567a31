//! Device binding — attaches a created port to a local network device.
//!
//! Plugging gives a bound port a real tap device behind a bridge, so the
//! agent on this host sees an interface to provision, exactly as if a
//! workload were attached. Everything is driven through the `ip` binary.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use netheat_common::models::{PortRecord, SubnetRecord};

const TAP_DEVICE_PREFIX: &str = "test-";
const BRIDGE_DEVICE_PREFIX: &str = "br-test-";
/// Kernel limit on interface name length (IFNAMSIZ minus the terminator).
const LINUX_DEV_LEN: usize = 14;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Binds ports to local network devices.
///
/// Shared by all workers in the pool; implementations must tolerate
/// concurrent calls for different ports.
#[async_trait]
pub trait DeviceBinder: Send + Sync {
    /// Plug `port` into a local device. `subnets` maps subnet id to the
    /// subnet records backing the port's fixed IPs.
    async fn plug_port(
        &self,
        port: &PortRecord,
        subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError>;

    /// Remove the local device created for `port`.
    async fn unplug_port(
        &self,
        port: &PortRecord,
        subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError>;
}

/// Production binder: one tap device enslaved to one bridge per port.
pub struct TapDeviceBinder;

impl TapDeviceBinder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TapDeviceBinder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBinder for TapDeviceBinder {
    async fn plug_port(
        &self,
        port: &PortRecord,
        subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError> {
        let tap = tap_name(&port.id);
        let bridge = bridge_name(&port.id);
        let cidrs: Vec<&str> = port
            .fixed_ips
            .iter()
            .filter_map(|ip| subnets.get(&ip.subnet_id))
            .map(|s| s.cidr.as_str())
            .collect();
        debug!(port = %port.name, tap = %tap, bridge = %bridge, ?cidrs, "plugging port");

        run_ip(&["link", "add", &bridge, "type", "bridge"]).await?;
        run_ip(&["tuntap", "add", &tap, "mode", "tap"]).await?;
        run_ip(&["link", "set", &tap, "master", &bridge]).await?;
        if let Some(mac) = &port.mac_address {
            run_ip(&["link", "set", &tap, "address", mac]).await?;
        }
        run_ip(&["link", "set", &bridge, "up"]).await?;
        run_ip(&["link", "set", &tap, "up"]).await?;
        Ok(())
    }

    async fn unplug_port(
        &self,
        port: &PortRecord,
        _subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError> {
        let tap = tap_name(&port.id);
        let bridge = bridge_name(&port.id);
        debug!(port = %port.name, tap = %tap, bridge = %bridge, "unplugging port");

        run_ip(&["link", "del", &tap]).await?;
        run_ip(&["link", "del", &bridge]).await?;
        Ok(())
    }
}

async fn run_ip(args: &[&str]) -> Result<(), DeviceError> {
    let status = tokio::process::Command::new("ip")
        .args(args)
        .status()
        .await
        .map_err(|source| DeviceError::Spawn {
            command: format!("ip {}", args.join(" ")),
            source,
        })?;
    if !status.success() {
        return Err(DeviceError::CommandFailed {
            command: format!("ip {}", args.join(" ")),
            status,
        });
    }
    Ok(())
}

/// Tap device name for a port, truncated to the kernel limit.
fn tap_name(port_id: &str) -> String {
    truncated(TAP_DEVICE_PREFIX, port_id)
}

/// Bridge device name for a port, truncated to the kernel limit.
fn bridge_name(port_id: &str) -> String {
    truncated(BRIDGE_DEVICE_PREFIX, port_id)
}

fn truncated(prefix: &str, port_id: &str) -> String {
    let mut name = format!("{prefix}{port_id}");
    name.truncate(LINUX_DEV_LEN);
    name
}
