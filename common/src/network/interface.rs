//! Primary interface selection.
//!
//! The primary interface is, in order of preference:
//! 1. the interface carrying the default route,
//! 2. the first viable interface with an assigned address (wired before wireless),
//! 3. the configured fallback name, if such an interface exists at all.

use pnet::datalink::NetworkInterface;

use crate::utils::interface::NetworkInterfaceExtension;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is operationally down.
    IsDown,
    /// The interface is the loopback device.
    IsLoopback,
    /// The interface belongs to a container bridge, VPN or similar.
    IsVirtual,
    /// The interface has no usable address.
    NoAddress,
}

/// How the primary interface was chosen.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Selection {
    DefaultRoute,
    FirstAddressed,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryInterface {
    pub interface: NetworkInterface,
    pub selection: Selection,
}

pub fn select_primary_interface(
    interfaces: &[NetworkInterface],
    default_route: Option<&str>,
    fallback: Option<&str>,
) -> Option<PrimaryInterface> {
    if let Some(interface) = default_route.and_then(|name| find_by_name(interfaces, name)) {
        return Some(PrimaryInterface {
            interface: interface.clone(),
            selection: Selection::DefaultRoute,
        });
    }

    let viable: Vec<&NetworkInterface> = interfaces
        .iter()
        .filter(|interface| is_viable_interface(interface).is_ok())
        .collect();

    if let Some(interface) = select_best_interface(&viable) {
        return Some(PrimaryInterface {
            interface: interface.clone(),
            selection: Selection::FirstAddressed,
        });
    }

    fallback
        .and_then(|name| find_by_name(interfaces, name))
        .map(|interface| PrimaryInterface {
            interface: interface.clone(),
            selection: Selection::Fallback,
        })
}

fn find_by_name<'a>(interfaces: &'a [NetworkInterface], name: &str) -> Option<&'a NetworkInterface> {
    interfaces.iter().find(|interface| interface.name == name)
}

pub fn is_viable_interface(interface: &NetworkInterface) -> Result<(), ViabilityError> {
    if interface.is_loopback() {
        return Err(ViabilityError::IsLoopback);
    }
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_virtual() {
        return Err(ViabilityError::IsVirtual);
    }
    if !interface.has_address() {
        return Err(ViabilityError::NoAddress);
    }
    Ok(())
}

fn select_best_interface<'a>(interfaces: &[&'a NetworkInterface]) -> Option<&'a NetworkInterface> {
    interfaces
        .iter()
        .find(|interface| interface.is_wired())
        .or_else(|| interfaces.first())
        .copied()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::IpNetwork;
    use pnet::util::MacAddr;

    const IFF_UP: u32 = 1;
    const IFF_BROADCAST: u32 = 1 << 1;
    const IFF_LOOPBACK: u32 = 1 << 3;

    fn create_mock_interface(name: &str, ips: Vec<IpNetwork>, flags: u32) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac: Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6)),
            ips,
            flags,
        }
    }

    fn lan_ips() -> Vec<IpNetwork> {
        vec!["192.168.1.10/24".parse().unwrap()]
    }

    fn lo() -> NetworkInterface {
        create_mock_interface(
            "lo",
            vec!["127.0.0.1/8".parse().unwrap()],
            IFF_UP | IFF_LOOPBACK,
        )
    }

    #[test]
    fn is_viable_interface_should_succeed() {
        let interface = create_mock_interface("eth0", lan_ips(), IFF_UP | IFF_BROADCAST);
        assert_eq!(is_viable_interface(&interface), Ok(()));
    }

    #[test]
    fn is_viable_interface_should_fail_loop_back() {
        assert_eq!(is_viable_interface(&lo()), Err(ViabilityError::IsLoopback));
    }

    #[test]
    fn is_viable_interface_should_fail_when_down() {
        let interface = create_mock_interface("eth0", lan_ips(), IFF_BROADCAST);
        assert_eq!(is_viable_interface(&interface), Err(ViabilityError::IsDown));
    }

    #[test]
    fn is_viable_interface_should_fail_for_docker_bridge() {
        let interface = create_mock_interface(
            "docker0",
            vec!["172.17.0.1/16".parse().unwrap()],
            IFF_UP | IFF_BROADCAST,
        );
        assert_eq!(is_viable_interface(&interface), Err(ViabilityError::IsVirtual));
    }

    #[test]
    fn is_viable_interface_should_fail_with_only_link_local() {
        let interface = create_mock_interface(
            "eth0",
            vec!["fe80::1234:5678:abcd:ef01/64".parse().unwrap()],
            IFF_UP | IFF_BROADCAST,
        );
        assert_eq!(is_viable_interface(&interface), Err(ViabilityError::NoAddress));
    }

    #[test]
    fn default_route_wins_over_wired() {
        let interfaces = vec![
            lo(),
            create_mock_interface("eth0", lan_ips(), IFF_UP | IFF_BROADCAST),
            create_mock_interface("wlan0", vec!["10.0.0.7/24".parse().unwrap()], IFF_UP | IFF_BROADCAST),
        ];
        let primary = select_primary_interface(&interfaces, Some("wlan0"), Some("eth0")).unwrap();
        assert_eq!(primary.interface.name, "wlan0");
        assert_eq!(primary.selection, Selection::DefaultRoute);
    }

    #[test]
    fn selects_wired_over_wireless_without_default_route() {
        let interfaces = vec![
            lo(),
            create_mock_interface("wlan0", vec!["10.0.0.7/24".parse().unwrap()], IFF_UP | IFF_BROADCAST),
            create_mock_interface("eth0", lan_ips(), IFF_UP | IFF_BROADCAST),
        ];
        let primary = select_primary_interface(&interfaces, None, None).unwrap();
        assert_eq!(primary.interface.name, "eth0");
        assert_eq!(primary.selection, Selection::FirstAddressed);
    }

    #[test]
    fn unknown_default_route_falls_through() {
        let interfaces = vec![create_mock_interface("end0", lan_ips(), IFF_UP | IFF_BROADCAST)];
        let primary = select_primary_interface(&interfaces, Some("ppp0"), None).unwrap();
        assert_eq!(primary.interface.name, "end0");
    }

    #[test]
    fn fallback_used_for_unaddressed_interface() {
        let interfaces = vec![lo(), create_mock_interface("eth0", vec![], IFF_BROADCAST)];
        let primary = select_primary_interface(&interfaces, None, Some("eth0")).unwrap();
        assert_eq!(primary.interface.name, "eth0");
        assert_eq!(primary.selection, Selection::Fallback);
    }

    #[test]
    fn fallback_must_exist() {
        let interfaces = vec![lo()];
        assert!(select_primary_interface(&interfaces, None, Some("eth0")).is_none());
    }

    #[test]
    fn no_interfaces_selects_nothing() {
        assert!(select_primary_interface(&[], None, Some("eth0")).is_none());
    }
}
