//! Data models for the netheat load generator.
//!
//! These mirror the wire shapes the control plane returns. The tool never
//! stores them durably — a record lives for the duration of one unit of
//! work (create path) or one cleanup pass (clean path).

use serde::{Deserialize, Serialize};

// ── Network ─────────────────────────────────────────────────────────

/// A virtual network owned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    pub name: String,
}

// ── Subnet ──────────────────────────────────────────────────────────

/// A subnet under one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetRecord {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    pub ip_version: u8,
}

// ── Port ────────────────────────────────────────────────────────────

/// One fixed-IP assignment on a port, linking it to a subnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// A port under one network, optionally bound to a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: String,
    pub name: String,
    pub network_id: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(default)]
    pub binding_host: Option<String>,
}

// ── Agent ───────────────────────────────────────────────────────────

/// A network agent as reported by the control plane's agent listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub host: String,
    pub binary: String,
    pub alive: bool,
}
