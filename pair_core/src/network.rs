//! LAN address discovery.
//!
//! The address advertised to peers is the one on the interface whose subnet
//! contains the default gateway.

use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("failed to discover gateway: {0}")]
    GatewayDiscovery(String),
    #[error("no local IPv4 address found in the same subnet as gateway {0}")]
    NoMatchingInterface(Ipv4Addr),
}

/// An IPv4 address together with its subnet prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    pub addr: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Self {
        Self { addr, prefix_len }
    }

    fn mask(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            n if n >= 32 => u32::MAX,
            n => u32::MAX << (32 - n),
        }
    }

    /// True when `ip` is inside this address's subnet
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(self.addr) & mask == u32::from(ip) & mask
    }
}

/// Snapshot of one network interface
#[derive(Debug, Clone)]
pub struct InterfaceAddrs {
    pub name: String,
    pub is_up: bool,
    /// `Err` when the interface's addresses could not be read
    pub addrs: Result<Vec<Ipv4Cidr>, String>,
}

/// Unicast and routable in the LAN sense: not unspecified, broadcast,
/// multicast or link-local. Private ranges count as global here.
fn is_global_unicast(ip: Ipv4Addr) -> bool {
    !(ip.is_unspecified() || ip.is_broadcast() || ip.is_multicast() || ip.is_link_local())
}

/// Pick the first usable IPv4 address whose subnet contains `gateway`.
///
/// Interfaces that are down are ignored; interfaces whose addresses could not
/// be read are logged and skipped.
pub fn select_lan_ip(
    gateway: Ipv4Addr,
    interfaces: &[InterfaceAddrs],
) -> Result<Ipv4Addr, NetworkError> {
    for iface in interfaces.iter().filter(|i| i.is_up) {
        let addrs = match &iface.addrs {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::warn!("Failed to get addresses for interface {}: {}", iface.name, e);
                continue;
            }
        };

        for net in addrs {
            if !is_global_unicast(net.addr) || net.addr.is_loopback() {
                continue;
            }
            if net.contains(gateway) {
                tracing::debug!("Gateway {} reachable via {} ({})", gateway, iface.name, net.addr);
                return Ok(net.addr);
            }
        }
    }

    Err(NetworkError::NoMatchingInterface(gateway))
}

/// Default gateway IPv4 address from the OS routing table
pub fn discover_gateway() -> Result<Ipv4Addr, NetworkError> {
    let gateway = netdev::get_default_gateway().map_err(NetworkError::GatewayDiscovery)?;
    gateway
        .ipv4
        .first()
        .copied()
        .ok_or_else(|| NetworkError::GatewayDiscovery("default gateway has no IPv4 address".into()))
}

/// Snapshot every interface the OS reports.
///
/// netdev enumerates all interfaces in one call and reports no per-interface
/// failure, so every snapshot taken here carries `Ok` addresses.
pub fn list_interfaces() -> Vec<InterfaceAddrs> {
    netdev::get_interfaces()
        .into_iter()
        .map(|iface| InterfaceAddrs {
            is_up: iface.is_up(),
            addrs: Ok(iface
                .ipv4
                .iter()
                .map(|net| Ipv4Cidr::new(net.addr(), net.prefix_len()))
                .collect()),
            name: iface.name,
        })
        .collect()
}

/// LAN IPv4 address other devices should use to reach this host.
pub fn local_lan_ip() -> Result<Ipv4Addr, NetworkError> {
    let gateway = discover_gateway()?;
    select_lan_ip(gateway, &list_interfaces())
}
