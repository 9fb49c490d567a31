//! Control-plane client — thin CRUD wrapper over the networking API.
//!
//! The trait is the seam the orchestrator and unit-of-work code see; the
//! HTTP implementation below is a well-bounded I/O wrapper with no state of
//! its own. Implementations must be safe for concurrent use — every worker
//! in the pool issues its own independent calls.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use netheat_common::error::ClientError;
use netheat_common::models::{AgentRecord, NetworkRecord, PortRecord, SubnetRecord};

use crate::config::Config;

/// CRUD operations the load generator needs from the control plane.
///
/// Every call returns an explicit `Result`; callers branch on the outcome
/// instead of relying on error propagation, because per-resource failures
/// are non-fatal by design.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    async fn create_network(&self, name: &str) -> Result<NetworkRecord, ClientError>;

    async fn create_subnet(
        &self,
        network_id: &str,
        name: &str,
        cidr: &str,
        ip_version: u8,
    ) -> Result<SubnetRecord, ClientError>;

    /// Create a port, bound to `binding_host` when given.
    async fn create_port(
        &self,
        network_id: &str,
        name: &str,
        binding_host: Option<&str>,
    ) -> Result<PortRecord, ClientError>;

    async fn list_networks(&self) -> Result<Vec<NetworkRecord>, ClientError>;

    async fn list_ports(&self, network_id: &str) -> Result<Vec<PortRecord>, ClientError>;

    async fn get_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, ClientError>;

    async fn delete_port(&self, port_id: &str) -> Result<(), ClientError>;

    async fn delete_network(&self, network_id: &str) -> Result<(), ClientError>;

    /// List agents known to the control plane. Per the listing contract
    /// only alive agents are returned.
    async fn list_agents(&self) -> Result<Vec<AgentRecord>, ClientError>;

    /// Lift the project's network/subnet/port quotas so a large create run
    /// is not rejected halfway through.
    async fn set_unlimited_quotas(&self) -> Result<(), ClientError>;
}

// ── HTTP implementation ─────────────────────────────────────────────

#[derive(Deserialize)]
struct NetworkBody {
    network: NetworkRecord,
}

#[derive(Deserialize)]
struct NetworksBody {
    networks: Vec<NetworkRecord>,
}

#[derive(Deserialize)]
struct SubnetBody {
    subnet: SubnetRecord,
}

#[derive(Deserialize)]
struct PortBody {
    port: PortRecord,
}

#[derive(Deserialize)]
struct PortsBody {
    ports: Vec<PortRecord>,
}

#[derive(Deserialize)]
struct AgentsBody {
    agents: Vec<AgentRecord>,
}

/// Networking API client over HTTP with token auth.
pub struct HttpControlPlane {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    project: String,
}

impl HttpControlPlane {
    /// Build a client from the resolved cloud profile.
    pub fn connect(cfg: &Config) -> Result<Self, ClientError> {
        info!(
            cloud = %cfg.cloud_name,
            region = %cfg.region_name,
            endpoint = %cfg.cloud.endpoint,
            "connecting to control plane"
        );
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(cfg.insecure)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            endpoint: cfg.cloud.endpoint.trim_end_matches('/').to_string(),
            token: cfg.cloud.token.clone(),
            project: cfg.cloud.project.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2.0/{path}", self.endpoint)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("X-Auth-Token", token),
            None => builder,
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ClientError> {
        let resp = self
            .request(self.http.post(self.url(path)).json(&body))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, ClientError> {
        let resp = self
            .request(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
            });
        }
        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn delete(&self, operation: &'static str, path: &str) -> Result<(), ClientError> {
        let resp = self
            .request(self.http.delete(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        // 404 on delete means someone else already removed it, which is
        // exactly the end state we want.
        if !status.is_success() && status.as_u16() != 404 {
            return Err(ClientError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

#[async_trait]
impl ControlPlaneClient for HttpControlPlane {
    async fn create_network(&self, name: &str) -> Result<NetworkRecord, ClientError> {
        let body: NetworkBody = self
            .post(
                "create network",
                "networks",
                json!({ "network": { "name": name } }),
            )
            .await?;
        Ok(body.network)
    }

    async fn create_subnet(
        &self,
        network_id: &str,
        name: &str,
        cidr: &str,
        ip_version: u8,
    ) -> Result<SubnetRecord, ClientError> {
        let body: SubnetBody = self
            .post(
                "create subnet",
                "subnets",
                json!({
                    "subnet": {
                        "network_id": network_id,
                        "name": name,
                        "cidr": cidr,
                        "ip_version": ip_version,
                    }
                }),
            )
            .await?;
        Ok(body.subnet)
    }

    async fn create_port(
        &self,
        network_id: &str,
        name: &str,
        binding_host: Option<&str>,
    ) -> Result<PortRecord, ClientError> {
        let mut port = json!({
            "network_id": network_id,
            "name": name,
        });
        if let Some(host) = binding_host {
            port["device_owner"] = json!("compute:netheat");
            port["binding:host_id"] = json!(host);
        }
        let body: PortBody = self
            .post("create port", "ports", json!({ "port": port }))
            .await?;
        Ok(body.port)
    }

    async fn list_networks(&self) -> Result<Vec<NetworkRecord>, ClientError> {
        let body: NetworksBody = self.get("list networks", "networks").await?;
        Ok(body.networks)
    }

    async fn list_ports(&self, network_id: &str) -> Result<Vec<PortRecord>, ClientError> {
        let body: PortsBody = self
            .get("list ports", &format!("ports?network_id={network_id}"))
            .await?;
        Ok(body.ports)
    }

    async fn get_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, ClientError> {
        let body: SubnetBody = self
            .get("get subnet", &format!("subnets/{subnet_id}"))
            .await?;
        Ok(body.subnet)
    }

    async fn delete_port(&self, port_id: &str) -> Result<(), ClientError> {
        self.delete("delete port", &format!("ports/{port_id}")).await
    }

    async fn delete_network(&self, network_id: &str) -> Result<(), ClientError> {
        self.delete("delete network", &format!("networks/{network_id}"))
            .await
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, ClientError> {
        let body: AgentsBody = self.get("list agents", "agents?alive=true").await?;
        Ok(body.agents)
    }

    async fn set_unlimited_quotas(&self) -> Result<(), ClientError> {
        let resp = self
            .request(
                self.http
                    .put(self.url(&format!("quotas/{}", self.project)))
                    .json(&json!({
                        "quota": { "network": -1, "subnet": -1, "port": -1 }
                    })),
            )
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                operation: "set quotas",
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
