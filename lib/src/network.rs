//! Provides helpers for selecting the local multicast interface

use pnet::datalink::NetworkInterface as PNetNetworkInterface;
use std::net::{IpAddr, Ipv4Addr};

/// Data structure representing a local interface carrying an IPv4 address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Name of the interface i.e. eth0
    pub name: String,
    /// First IPv4 address assigned to the interface
    pub ipv4: Ipv4Addr,
    /// True when the interface advertises multicast support
    pub multicast: bool,
}

impl TryFrom<&PNetNetworkInterface> for NetworkInterface {
    type Error = ();

    fn try_from(value: &PNetNetworkInterface) -> Result<Self, Self::Error> {
        let ipv4 = value
            .ips
            .iter()
            .find_map(|net| match net.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .ok_or(())?;

        Ok(Self {
            name: value.name.clone(),
            ipv4,
            multicast: value.is_multicast(),
        })
    }
}

/// Returns every local interface that has an IPv4 address
pub fn get_ipv4_interfaces() -> Vec<NetworkInterface> {
    pnet::datalink::interfaces()
        .iter()
        .filter_map(|i| NetworkInterface::try_from(i).ok())
        .collect()
}

/// Finds an IPv4 capable interface by name
///
/// Example
/// ```no_run
/// # use malt_lib::network;
/// let interface = network::get_interface("eth0").unwrap();
/// println!("{} -> {}", interface.name, interface.ipv4);
/// ```
pub fn get_interface(name: &str) -> Option<NetworkInterface> {
    get_ipv4_interfaces().into_iter().find(|i| i.name == name)
}

#[cfg(test)]
#[path = "./network_tests.rs"]
mod tests;
