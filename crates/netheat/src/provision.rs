//! Unit of work: provision or tear down one network and everything under it.
//!
//! Both paths are best-effort. The point of the tool is to generate as much
//! load as the control plane will take, so a failed subnet or port degrades
//! the unit's output but never aborts it. The single hard dependency is the
//! network itself: without it there is nothing to nest resources under, so
//! a failed network create ends the unit immediately.

use std::collections::HashMap;

use tracing::{error, info, warn};

use netheat_common::models::{NetworkRecord, SubnetRecord};
use netheat_common::naming;

use crate::config::Config;
use crate::control::ControlPlaneClient;
use crate::device::DeviceBinder;

/// Create one network with its subnets and bound ports.
///
/// Returns `true` once the network exists, regardless of how many subnets
/// or ports succeeded — the caller only counts units that produced no load
/// at all as failed.
pub async fn create_network_with_ports(
    slot: u32,
    cfg: &Config,
    client: &dyn ControlPlaneClient,
    binder: &dyn DeviceBinder,
) -> bool {
    let network_name = naming::network_name(slot, &cfg.hostname);
    info!(network = %network_name, "starting to create network");
    let network = match client.create_network(&network_name).await {
        Ok(network) => network,
        Err(e) => {
            error!(network = %network_name, error = %e, "failed to create network, stopping worker");
            return false;
        }
    };

    let mut subnets: HashMap<String, SubnetRecord> = HashMap::new();
    for ordinal in 0..cfg.ipv4_subnets {
        let name = naming::v4_subnet_name(ordinal, slot, &cfg.hostname);
        let cidr = naming::v4_cidr(ordinal);
        match client.create_subnet(&network.id, &name, &cidr, 4).await {
            Ok(subnet) => {
                subnets.insert(subnet.id.clone(), subnet);
            }
            Err(e) => {
                warn!(subnet = %name, network_id = %network.id, error = %e, "subnet creation failed");
            }
        }
    }

    for ordinal in 0..cfg.ipv6_subnets {
        let name = naming::v6_subnet_name(ordinal, slot, &cfg.hostname);
        let cidr = naming::v6_cidr(ordinal);
        match client.create_subnet(&network.id, &name, &cidr, 6).await {
            Ok(subnet) => {
                subnets.insert(subnet.id.clone(), subnet);
            }
            Err(e) => {
                warn!(subnet = %name, network_id = %network.id, error = %e, "subnet creation failed");
            }
        }
    }

    // Ports only make sense with at least one subnet to bind to.
    if !subnets.is_empty() {
        for ordinal in 0..cfg.ports {
            let name = naming::port_name(ordinal, slot, &cfg.hostname);
            match client
                .create_port(&network.id, &name, Some(&cfg.hostname))
                .await
            {
                Ok(port) => {
                    if let Err(e) = binder.plug_port(&port, &subnets).await {
                        error!(port = %port.name, network_id = %network.id, error = %e, "failed to plug port on the host");
                    }
                }
                Err(e) => {
                    warn!(port = %name, network_id = %network.id, error = %e, "port creation failed");
                }
            }
        }
    }
    true
}

/// Tear down one previously-discovered network: unplug and delete its
/// ports, then delete the network itself.
///
/// Idempotent by construction — re-running on a half-cleaned network just
/// deletes whatever is left, so a crash mid-cleanup is recovered by
/// invoking clean again. Returns `true` when the network itself was
/// deleted.
pub async fn clean_network_with_ports(
    network: &NetworkRecord,
    client: &dyn ControlPlaneClient,
    binder: &dyn DeviceBinder,
) -> bool {
    info!(network = %network.name, network_id = %network.id, "cleaning network");
    let ports = match client.list_ports(&network.id).await {
        Ok(ports) => ports,
        Err(e) => {
            warn!(network_id = %network.id, error = %e, "failed to list ports, skipping them");
            Vec::new()
        }
    };

    for port in ports {
        let mut subnets: HashMap<String, SubnetRecord> = HashMap::new();
        for fixed_ip in &port.fixed_ips {
            if subnets.contains_key(&fixed_ip.subnet_id) {
                continue;
            }
            match client.get_subnet(&fixed_ip.subnet_id).await {
                Ok(subnet) => {
                    subnets.insert(subnet.id.clone(), subnet);
                }
                Err(e) => {
                    warn!(subnet_id = %fixed_ip.subnet_id, network_id = %network.id, error = %e, "subnet lookup failed, omitting from unplug");
                }
            }
        }
        if let Err(e) = binder.unplug_port(&port, &subnets).await {
            error!(port = %port.name, network_id = %network.id, error = %e, "failed to unplug port");
        }
        if let Err(e) = client.delete_port(&port.id).await {
            warn!(port = %port.name, network_id = %network.id, error = %e, "port deletion failed");
        }
    }

    match client.delete_network(&network.id).await {
        Ok(()) => true,
        Err(e) => {
            warn!(network = %network.name, network_id = %network.id, error = %e, "network deletion failed");
            false
        }
    }
}
