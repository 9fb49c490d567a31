//! Deterministic, host-scoped resource naming.
//!
//! Every resource the tool creates carries the invoking host's name, so a
//! later, independent `clean` invocation can recognize exactly the resources
//! this host generated — without any persisted state, and without colliding
//! with other hosts running the tool against the same control plane.
//!
//! The reverse predicate matches *any* slot index for the given host, not a
//! list of indices built from the current run's configuration. A clean run
//! therefore reclaims networks left behind by an earlier run that was
//! configured with a larger network count.

/// Per-network IPv4 subnet limit — the subnet ordinal is the third octet of
/// a `/24` under `192.168.0.0/16`, so it must fit in a u8.
pub const MAX_V4_SUBNETS_PER_NETWORK: u32 = 256;

/// Per-network IPv6 subnet limit — the subnet ordinal is one hextet of the
/// `/64` prefix, so it must fit in a u16.
pub const MAX_V6_SUBNETS_PER_NETWORK: u32 = 65536;

const NETWORK_PREFIX: &str = "network-";
const HOST_SEPARATOR: &str = "-host-";

/// Name of the network for one work slot: `network-{slot}-host-{host}`.
pub fn network_name(slot: u32, host: &str) -> String {
    format!("{NETWORK_PREFIX}{slot}{HOST_SEPARATOR}{host}")
}

/// Reverse predicate: was `name` generated by [`network_name`] on `host`,
/// for *some* slot index?
///
/// Anchored at both ends: the literal prefix, a non-empty decimal index,
/// and the exact `-host-{host}` remainder. A name scoped to a different
/// host never matches, and neither do near-misses like a missing index.
pub fn is_heater_network(name: &str, host: &str) -> bool {
    let Some(rest) = name.strip_prefix(NETWORK_PREFIX) else {
        return false;
    };
    let Some(index) = rest.strip_suffix(host) else {
        return false;
    };
    let Some(index) = index.strip_suffix(HOST_SEPARATOR) else {
        return false;
    };
    !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())
}

/// IPv4 subnet name, unique within one network's creation pass.
pub fn v4_subnet_name(ordinal: u32, slot: u32, host: &str) -> String {
    format!("v4-subnet-{ordinal}-net-{slot}{HOST_SEPARATOR}{host}")
}

/// IPv6 subnet name, unique within one network's creation pass.
pub fn v6_subnet_name(ordinal: u32, slot: u32, host: &str) -> String {
    format!("v6-subnet-{ordinal}-net-{slot}{HOST_SEPARATOR}{host}")
}

/// Port name, unique within one network's creation pass.
pub fn port_name(ordinal: u32, slot: u32, host: &str) -> String {
    format!("port-{ordinal}-net-{slot}{HOST_SEPARATOR}{host}")
}

/// IPv4 CIDR for a subnet ordinal: `192.168.{ordinal}.0/24`.
///
/// Parameterized only by the ordinal within the network. Subnets in
/// different networks are isolated by the network boundary, so CIDR reuse
/// across networks is safe. The ordinal must be below
/// [`MAX_V4_SUBNETS_PER_NETWORK`]; configuration validation enforces this
/// before any work is dispatched.
pub fn v4_cidr(ordinal: u32) -> String {
    debug_assert!(ordinal < MAX_V4_SUBNETS_PER_NETWORK);
    format!("192.168.{ordinal}.0/24")
}

/// IPv6 CIDR for a subnet ordinal: `2000:{ordinal:x}::/64`.
///
/// The ordinal must be below [`MAX_V6_SUBNETS_PER_NETWORK`]; configuration
/// validation enforces this before any work is dispatched.
pub fn v6_cidr(ordinal: u32) -> String {
    debug_assert!(ordinal < MAX_V6_SUBNETS_PER_NETWORK);
    format!("2000:{ordinal:x}::/64")
}
