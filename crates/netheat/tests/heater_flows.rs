//! End-to-end create/clean flows against an in-memory control plane.
//!
//! The fake client stores networks/subnets/ports in a mutex-guarded map and
//! can be told to fail specific creates, which is enough to exercise the
//! partial-failure containment and idempotence guarantees of the real flows.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use netheat::config::{Action, CloudProfile, Config};
use netheat::control::ControlPlaneClient;
use netheat::device::{DeviceBinder, DeviceError};
use netheat::run;
use netheat_common::error::ClientError;
use netheat_common::models::{
    AgentRecord, FixedIp, NetworkRecord, PortRecord, SubnetRecord,
};
use netheat_common::naming;

const HOST: &str = "compute-1";

// ── Fake control plane ──────────────────────────────────────────────

#[derive(Default)]
struct State {
    next_id: u64,
    networks: HashMap<String, NetworkRecord>,
    subnets: HashMap<String, SubnetRecord>,
    ports: HashMap<String, PortRecord>,
    port_creates_requested: usize,
    deletions: usize,
    quotas_lifted: bool,
}

impl State {
    fn allocate_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{:04}", self.next_id)
    }
}

#[derive(Default)]
struct FakeControlPlane {
    state: Mutex<State>,
    /// Network names whose creation fails.
    fail_networks: HashSet<String>,
    /// Network names under which every subnet creation fails.
    fail_subnets_under: HashSet<String>,
}

impl FakeControlPlane {
    /// Insert a network that some other actor created.
    fn seed_network(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id("net");
        state.networks.insert(
            id.clone(),
            NetworkRecord {
                id,
                name: name.to_string(),
            },
        );
    }

    fn network_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.networks.values().map(|n| n.name.clone()).collect()
    }
}

fn failed(operation: &'static str) -> ClientError {
    ClientError::UnexpectedStatus {
        operation,
        status: 500,
    }
}

#[async_trait]
impl ControlPlaneClient for FakeControlPlane {
    async fn create_network(&self, name: &str) -> Result<NetworkRecord, ClientError> {
        if self.fail_networks.contains(name) {
            return Err(failed("create network"));
        }
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id("net");
        let network = NetworkRecord {
            id: id.clone(),
            name: name.to_string(),
        };
        state.networks.insert(id, network.clone());
        Ok(network)
    }

    async fn create_subnet(
        &self,
        network_id: &str,
        name: &str,
        cidr: &str,
        ip_version: u8,
    ) -> Result<SubnetRecord, ClientError> {
        let mut state = self.state.lock().unwrap();
        let network_name = state
            .networks
            .get(network_id)
            .map(|n| n.name.clone())
            .ok_or_else(|| failed("create subnet"))?;
        if self.fail_subnets_under.contains(&network_name) {
            return Err(failed("create subnet"));
        }
        let id = state.allocate_id("subnet");
        let subnet = SubnetRecord {
            id: id.clone(),
            name: name.to_string(),
            network_id: network_id.to_string(),
            cidr: cidr.to_string(),
            ip_version,
        };
        state.subnets.insert(id, subnet.clone());
        Ok(subnet)
    }

    async fn create_port(
        &self,
        network_id: &str,
        name: &str,
        binding_host: Option<&str>,
    ) -> Result<PortRecord, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.port_creates_requested += 1;
        // A port gets one fixed IP on every subnet of its network.
        let fixed_ips: Vec<FixedIp> = state
            .subnets
            .values()
            .filter(|s| s.network_id == network_id)
            .map(|s| FixedIp {
                subnet_id: s.id.clone(),
                ip_address: None,
            })
            .collect();
        let id = state.allocate_id("port");
        let port = PortRecord {
            id: id.clone(),
            name: name.to_string(),
            network_id: network_id.to_string(),
            mac_address: Some("fa:16:3e:00:00:01".into()),
            fixed_ips,
            binding_host: binding_host.map(str::to_string),
        };
        state.ports.insert(id, port.clone());
        Ok(port)
    }

    async fn list_networks(&self) -> Result<Vec<NetworkRecord>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.networks.values().cloned().collect())
    }

    async fn list_ports(&self, network_id: &str) -> Result<Vec<PortRecord>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .ports
            .values()
            .filter(|p| p.network_id == network_id)
            .cloned()
            .collect())
    }

    async fn get_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| failed("get subnet"))
    }

    async fn delete_port(&self, port_id: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.ports.remove(port_id).is_some() {
            state.deletions += 1;
        }
        Ok(())
    }

    async fn delete_network(&self, network_id: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.networks.remove(network_id).is_some() {
            state.deletions += 1;
        }
        state.subnets.retain(|_, s| s.network_id != network_id);
        Ok(())
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, ClientError> {
        Ok(Vec::new())
    }

    async fn set_unlimited_quotas(&self) -> Result<(), ClientError> {
        self.state.lock().unwrap().quotas_lifted = true;
        Ok(())
    }
}

// ── Fake device binder ──────────────────────────────────────────────

#[derive(Default)]
struct FakeBinder {
    plugged: Mutex<Vec<String>>,
    unplugged: Mutex<Vec<String>>,
}

#[async_trait]
impl DeviceBinder for FakeBinder {
    async fn plug_port(
        &self,
        port: &PortRecord,
        subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError> {
        assert!(
            !subnets.is_empty(),
            "a port must never be plugged without subnets"
        );
        self.plugged.lock().unwrap().push(port.id.clone());
        Ok(())
    }

    async fn unplug_port(
        &self,
        port: &PortRecord,
        _subnets: &HashMap<String, SubnetRecord>,
    ) -> Result<(), DeviceError> {
        self.unplugged.lock().unwrap().push(port.id.clone());
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────

fn test_config(networks: u32, ipv4: u32, ipv6: u32, ports: u32) -> Arc<Config> {
    Arc::new(Config {
        action: Action::Create,
        networks,
        ipv4_subnets: ipv4,
        ipv6_subnets: ipv6,
        ports,
        concurrency: 4,
        hostname: HOST.into(),
        cloud_name: "test".into(),
        region_name: "RegionOne".into(),
        insecure: false,
        cloud: CloudProfile {
            endpoint: "http://127.0.0.1:9696".into(),
            token: None,
            project: "admin".into(),
        },
        l2_agent_name: "ovn-controller".into(),
        inventory_file_name: PathBuf::from("hosts"),
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_clean_round_trip_leaves_nothing_behind() {
    let cfg = test_config(3, 1, 1, 2);
    let fake = Arc::new(FakeControlPlane::default());
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    let summary = run::create_resources(cfg.clone(), client.clone(), device.clone()).await;
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 3);

    {
        let state = fake.state.lock().unwrap();
        assert!(state.quotas_lifted);
        assert_eq!(state.networks.len(), 3);
        assert_eq!(state.subnets.len(), 6, "one v4 and one v6 subnet each");
        // networks * ports port creations were requested
        assert_eq!(state.port_creates_requested, 6);
        assert_eq!(state.ports.len(), 6);
    }
    assert_eq!(binder.plugged.lock().unwrap().len(), 6);

    let summary = run::clean_all(cfg.clone(), client, device).await;
    assert_eq!(summary.succeeded, 3);

    let state = fake.state.lock().unwrap();
    assert!(state.networks.is_empty());
    assert!(state.ports.is_empty());
    assert!(state.subnets.is_empty());
    assert_eq!(binder.unplugged.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn clean_twice_deletes_nothing_the_second_time() {
    let cfg = test_config(2, 1, 0, 1);
    let fake = Arc::new(FakeControlPlane::default());
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    run::create_resources(cfg.clone(), client.clone(), device.clone()).await;
    run::clean_all(cfg.clone(), client.clone(), device.clone()).await;
    let deletions_after_first = fake.state.lock().unwrap().deletions;

    let summary = run::clean_all(cfg, client, device).await;
    assert_eq!(summary.total, 0, "nothing matches the predicate anymore");
    assert_eq!(fake.state.lock().unwrap().deletions, deletions_after_first);
}

#[tokio::test]
async fn total_subnet_failure_suppresses_ports_for_that_slot_only() {
    let cfg = test_config(3, 1, 0, 2);
    let fake = Arc::new(FakeControlPlane {
        fail_subnets_under: HashSet::from([naming::network_name(1, HOST)]),
        ..Default::default()
    });
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    let summary = run::create_resources(cfg, client, device).await;
    // The unit still created its network, so it counts as succeeded.
    assert_eq!(summary.succeeded, 3);

    let state = fake.state.lock().unwrap();
    // Only the two healthy slots requested ports.
    assert_eq!(state.port_creates_requested, 4);
    let starved_network = state
        .networks
        .values()
        .find(|n| n.name == naming::network_name(1, HOST))
        .expect("network of slot 1 exists");
    assert!(
        !state
            .ports
            .values()
            .any(|p| p.network_id == starved_network.id),
        "no ports under the subnet-less network"
    );
}

#[tokio::test]
async fn network_create_failure_aborts_only_its_unit() {
    let cfg = test_config(3, 1, 1, 1);
    let fake = Arc::new(FakeControlPlane {
        fail_networks: HashSet::from([naming::network_name(0, HOST)]),
        ..Default::default()
    });
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    let summary = run::create_resources(cfg, client, device).await;
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let state = fake.state.lock().unwrap();
    assert_eq!(state.networks.len(), 2);
    assert_eq!(state.subnets.len(), 4, "no subnet work for the failed slot");
    assert_eq!(state.port_creates_requested, 2);
}

#[tokio::test]
async fn clean_only_claims_this_hosts_networks() {
    let cfg = test_config(2, 1, 0, 1);
    let fake = Arc::new(FakeControlPlane::default());
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    // Resources belonging to another host and to another tool entirely.
    fake.seed_network(&naming::network_name(0, "compute-2"));
    fake.seed_network("production-network");

    run::create_resources(cfg.clone(), client.clone(), device.clone()).await;
    run::clean_all(cfg, client, device).await;

    let mut remaining = fake.network_names();
    remaining.sort();
    assert_eq!(
        remaining,
        vec![
            naming::network_name(0, "compute-2"),
            "production-network".to_string()
        ]
    );
}

#[tokio::test]
async fn clean_reclaims_slots_beyond_the_current_network_count() {
    // Simulate a prior run configured with more networks than today's run.
    let cfg = test_config(1, 1, 0, 0);
    let fake = Arc::new(FakeControlPlane::default());
    let binder = Arc::new(FakeBinder::default());
    let client: Arc<dyn ControlPlaneClient> = fake.clone();
    let device: Arc<dyn DeviceBinder> = binder.clone();

    for slot in 0..5 {
        fake.seed_network(&naming::network_name(slot, HOST));
    }

    let summary = run::clean_all(cfg, client, device).await;
    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 5);
    assert!(fake.network_names().is_empty());
}
