use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};

const VIRTUAL_PREFIXES: &[&str] = &["docker", "veth", "br-", "virbr", "cni", "flannel", "tun", "tap", "wg"];

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    /// The address a snapshot should report for this interface.
    fn get_primary_net(&self) -> Option<IpNetwork>;
    fn has_address(&self) -> bool;
    fn is_virtual(&self) -> bool;
    fn is_wired(&self) -> bool;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    fn get_primary_net(&self) -> Option<IpNetwork> {
        // IPv4 first, link-local IPv6 never
        self.get_ipv4_nets()
            .into_iter()
            .find(|net| !net.ip().is_loopback() && net.ip() != Ipv4Addr::UNSPECIFIED)
            .map(IpNetwork::V4)
            .or_else(|| {
                self.ips.iter().copied().find(|net| match net.ip() {
                    IpAddr::V6(v6) => !v6.is_loopback() && !v6.is_unicast_link_local(),
                    IpAddr::V4(_) => false,
                })
            })
    }

    fn has_address(&self) -> bool {
        self.get_primary_net().is_some()
    }

    fn is_virtual(&self) -> bool {
        VIRTUAL_PREFIXES.iter().any(|prefix| self.name.starts_with(prefix))
    }

    fn is_wired(&self) -> bool {
        // eth0, end0, enp1s0, ...
        self.name.starts_with('e') && !self.is_virtual()
    }
}
