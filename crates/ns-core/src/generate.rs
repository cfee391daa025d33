//! Procedural topology generators.
//!
//! Pure functions: they only build edge lists, which are then laid out and
//! materialized exactly like a loaded file.

use crate::name::NodeName;
use crate::topology::{Edge, Topology};

/// Largest host count [`generate_flat`] accepts.
pub const MAX_FLAT_HOSTS: u32 = 100;
/// Largest switch count [`generate_flat`] accepts.
pub const MAX_FLAT_SWITCHES: u32 = 10;
/// Largest subnet count [`generate_subnet`] accepts.
pub const MAX_SUBNETS: u32 = 20;
/// Largest per-subnet host count [`generate_subnet`] accepts.
pub const MAX_HOSTS_PER_SUBNET: u32 = 50;

fn clamp(what: &str, requested: u32, max: u32) -> u64 {
    if requested > max {
        log::warn!("{what} clamped from {requested} to {max}");
    }
    u64::from(requested.min(max))
}

/// Every host `h1..=hosts` wired to a single switch `s1`.
///
/// `switches` is accepted for interface compatibility but only `s1` is ever
/// wired; additional switches are not created. Callers that want several
/// switches should use [`generate_subnet`]. Counts above [`MAX_FLAT_HOSTS`]
/// and [`MAX_FLAT_SWITCHES`] are clamped.
pub fn generate_flat(hosts: u32, switches: u32) -> Topology {
    let hosts = clamp("flat host count", hosts, MAX_FLAT_HOSTS);
    let switches = clamp("flat switch count", switches, MAX_FLAT_SWITCHES);
    if switches > 1 {
        log::warn!("flat topology wires a single switch; ignoring {} extra", switches - 1);
    }
    let mut topo = Topology::new();
    let Some(s1) = NodeName::switch(1) else {
        return topo;
    };
    for h in (1..=hosts).filter_map(NodeName::host) {
        topo.extend_edge(h, s1);
    }
    log::info!("generated flat topology: {hosts} host(s), {} edge(s)", topo.len());
    topo
}

/// A star of stars.
///
/// Subnet `i` (1-based) gets switch `s<i>` and `hosts_per_subnet` hosts with
/// globally increasing host numbers. Every subnet switch is then wired to a
/// central switch `s<subnets + 1>`. Counts above [`MAX_SUBNETS`] and
/// [`MAX_HOSTS_PER_SUBNET`] are clamped.
pub fn generate_subnet(subnets: u32, hosts_per_subnet: u32) -> Topology {
    let subnets = clamp("subnet count", subnets, MAX_SUBNETS);
    let hosts_per_subnet = clamp("hosts per subnet", hosts_per_subnet, MAX_HOSTS_PER_SUBNET);
    let mut topo = Topology::new();
    let mut hosts = (1..).filter_map(NodeName::host);

    for subnet in (1..=subnets).filter_map(NodeName::switch) {
        for h in hosts.by_ref().take(hosts_per_subnet as usize) {
            topo.extend_edge(h, subnet);
        }
    }

    if let Some(central) = NodeName::switch(subnets + 1) {
        for subnet in (1..=subnets).filter_map(NodeName::switch) {
            topo.extend_edge(subnet, central);
        }
    }

    log::info!(
        "generated subnet topology: {subnets} subnet(s) x {hosts_per_subnet} host(s), {} edge(s)",
        topo.len()
    );
    topo
}

impl Topology {
    fn extend_edge(&mut self, a: NodeName, b: NodeName) {
        if let Some(edge) = Edge::new(a, b) {
            self.push(edge);
        }
    }
}
