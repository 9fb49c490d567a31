//! Create and clean flows — build the work list and fan it out.

use std::sync::Arc;

use tracing::{info, warn};

use netheat_common::naming;

use crate::config::Config;
use crate::control::ControlPlaneClient;
use crate::device::DeviceBinder;
use crate::orchestrator::{run_concurrently, RunSummary};
use crate::provision;

/// Create `cfg.networks` networks, each with its subnets and bound ports.
///
/// Quotas are lifted first so a large run is not rejected halfway through;
/// if that fails the run proceeds against whatever limits are in place.
pub async fn create_resources(
    cfg: Arc<Config>,
    client: Arc<dyn ControlPlaneClient>,
    binder: Arc<dyn DeviceBinder>,
) -> RunSummary {
    if let Err(e) = client.set_unlimited_quotas().await {
        warn!(error = %e, "failed to lift quotas, continuing with current limits");
    }

    let slots: Vec<u32> = (0..cfg.networks).collect();
    let concurrency = cfg.concurrency;
    run_concurrently(slots, concurrency, move |slot| {
        let cfg = cfg.clone();
        let client = client.clone();
        let binder = binder.clone();
        async move {
            provision::create_network_with_ports(slot, &cfg, client.as_ref(), binder.as_ref())
                .await
        }
    })
    .await
}

/// Delete every network this host created earlier, with everything under it.
///
/// The work list is a fresh listing filtered by the naming predicate — no
/// state from the create run is needed, and networks left behind by a run
/// with a larger network count are reclaimed too.
pub async fn clean_all(
    cfg: Arc<Config>,
    client: Arc<dyn ControlPlaneClient>,
    binder: Arc<dyn DeviceBinder>,
) -> RunSummary {
    let all_networks = match client.list_networks().await {
        Ok(networks) => networks,
        Err(e) => {
            warn!(error = %e, "failed to list networks, nothing to clean");
            return RunSummary::default();
        }
    };
    let to_clean: Vec<_> = all_networks
        .into_iter()
        .filter(|n| naming::is_heater_network(&n.name, &cfg.hostname))
        .collect();
    info!(matching = to_clean.len(), host = %cfg.hostname, "networks selected for cleanup");

    let concurrency = cfg.concurrency;
    run_concurrently(to_clean, concurrency, move |network| {
        let client = client.clone();
        let binder = binder.clone();
        async move {
            provision::clean_network_with_ports(&network, client.as_ref(), binder.as_ref()).await
        }
    })
    .await
}
