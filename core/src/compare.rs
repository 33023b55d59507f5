//! Network change detection.
//!
//! Only the address, the gateway and the configuration mode count. DNS servers and the
//! reachability flag flap too often to justify a recovery on their own, and neither does a
//! mode that could not be read.

use nanowatch_common::models::NetworkSnapshot;

pub fn has_changed(previous: &NetworkSnapshot, current: &NetworkSnapshot) -> bool {
    previous.ip_address != current.ip_address
        || previous.gateway_address != current.gateway_address
        || mode_changed(previous, current)
}

/// Both modes are known and differ.
fn mode_changed(previous: &NetworkSnapshot, current: &NetworkSnapshot) -> bool {
    previous.configuration_mode.is_known()
        && current.configuration_mode.is_known()
        && previous.configuration_mode != current.configuration_mode
}

/// Human readable list of the differences that [`has_changed`] looks at.
pub fn changes(previous: &NetworkSnapshot, current: &NetworkSnapshot) -> Vec<String> {
    let mut changes = Vec::new();
    if previous.ip_address != current.ip_address {
        changes.push(format!(
            "address {} -> {}",
            display(previous.ip_address),
            display(current.ip_address)
        ));
    }
    if previous.gateway_address != current.gateway_address {
        changes.push(format!(
            "gateway {} -> {}",
            display(previous.gateway_address),
            display(current.gateway_address)
        ));
    }
    if mode_changed(previous, current) {
        changes.push(format!(
            "mode {} -> {}",
            previous.configuration_mode, current.configuration_mode
        ));
    }
    changes
}

fn display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
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
    use std::net::{IpAddr, Ipv4Addr};

    use chrono::{Duration, Utc};
    use nanowatch_common::models::ConfigurationMode;

    fn snapshot(ip: [u8; 4], mode: ConfigurationMode) -> NetworkSnapshot {
        NetworkSnapshot {
            interface_name: "eth0".to_string(),
            ip_address: Some(IpAddr::V4(Ipv4Addr::from(ip))),
            gateway_address: Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))),
            prefix_len: Some(24),
            dns_servers: vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))],
            configuration_mode: mode,
            internet_reachable: true,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn new_dhcp_lease_is_a_change() {
        let a = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let b = snapshot([192, 168, 1, 50], ConfigurationMode::Dhcp);
        assert!(has_changed(&a, &b));
        assert_eq!(changes(&a, &b), vec!["address 192.168.1.10 -> 192.168.1.50"]);
    }

    #[test]
    fn capture_time_alone_is_not_a_change() {
        let a = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let mut b = a.clone();
        b.captured_at = a.captured_at + Duration::seconds(30);
        assert!(!has_changed(&a, &b));
        assert!(changes(&a, &b).is_empty());
    }

    #[test]
    fn dns_and_reachability_are_not_a_change() {
        let a = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let mut b = a.clone();
        b.dns_servers = vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1))];
        b.internet_reachable = false;
        b.captured_at = a.captured_at + Duration::seconds(30);
        assert!(!has_changed(&a, &b));
    }

    #[test]
    fn mode_toggle_is_a_change() {
        let a = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let b = snapshot([192, 168, 1, 10], ConfigurationMode::Static);
        assert!(has_changed(&a, &b));
        assert_eq!(changes(&a, &b), vec!["mode DHCP -> STATIC"]);
    }

    #[test]
    fn unreadable_mode_is_not_a_change() {
        let dhcp = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let unknown = snapshot([192, 168, 1, 10], ConfigurationMode::Unknown);
        assert!(!has_changed(&dhcp, &unknown));
        assert!(!has_changed(&unknown, &dhcp));
        assert!(changes(&dhcp, &unknown).is_empty());
    }

    #[test]
    fn losing_gateway_is_a_change() {
        let a = snapshot([192, 168, 1, 10], ConfigurationMode::Dhcp);
        let mut b = a.clone();
        b.gateway_address = None;
        assert!(has_changed(&a, &b));
        assert_eq!(changes(&a, &b), vec!["gateway 192.168.1.1 -> none"]);
    }

    #[test]
    fn every_ip_difference_is_detected() {
        let base = snapshot([10, 0, 0, 1], ConfigurationMode::Static);
        for last in 2..=254u8 {
            let other = snapshot([10, 0, 0, last], ConfigurationMode::Static);
            assert!(has_changed(&base, &other), "10.0.0.{last}");
        }
        let mut lost = base.clone();
        lost.ip_address = None;
        assert!(has_changed(&base, &lost));
    }
}
