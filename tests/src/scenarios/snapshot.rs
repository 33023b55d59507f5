use std::net::IpAddr;

use nanowatch_common::models::ConfigurationMode;
use nanowatch_core::compare;

use super::snapshotter;
use crate::fakes::FakeInspector;
use crate::util::{docker0, eth0, lo, wlan0};

#[tokio::test]
async fn host_without_interfaces_is_unreachable() {
    let inspector = FakeInspector::new(Vec::new());
    inspector.set_reachable(true);
    let (snapshotter, ..) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let snapshot = snapshotter.capture().await;

    assert!(!snapshot.has_interface());
    assert!(!snapshot.internet_reachable);
    assert_eq!(snapshot.ip_address, None);
    assert_eq!(snapshot.configuration_mode, ConfigurationMode::Unknown);
}

#[tokio::test]
async fn only_loopback_and_containers_is_unreachable() {
    let inspector = FakeInspector::new(vec![lo(), docker0()]);
    inspector.set_reachable(true);
    let (snapshotter, ..) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let snapshot = snapshotter.capture().await;

    assert!(!snapshot.has_interface());
    assert!(!snapshot.internet_reachable);
}

#[tokio::test]
async fn captures_the_routed_interface() {
    let inspector = FakeInspector::new(vec![lo(), eth0(10), wlan0()]);
    inspector.set_route("eth0", Some("192.168.1.1".parse().unwrap()));
    inspector.set_dns(vec!["192.168.1.1".parse().unwrap(), "8.8.8.8".parse().unwrap()]);
    inspector.set_reachable(true);
    let (snapshotter, ..) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let snapshot = snapshotter.capture().await;

    assert_eq!(snapshot.interface_name, "eth0");
    assert_eq!(snapshot.cidr().as_deref(), Some("192.168.1.10/24"));
    assert_eq!(snapshot.gateway_address, Some("192.168.1.1".parse().unwrap()));
    let expected_dns: Vec<IpAddr> = vec!["192.168.1.1".parse().unwrap(), "8.8.8.8".parse().unwrap()];
    assert_eq!(snapshot.dns_servers, expected_dns);
    assert_eq!(snapshot.configuration_mode, ConfigurationMode::Dhcp);
    assert!(snapshot.internet_reachable);
}

#[tokio::test]
async fn gateway_of_another_interface_is_not_reported() {
    let inspector = FakeInspector::new(vec![lo(), eth0(10)]);
    inspector.set_route("ppp0", Some("10.64.0.1".parse().unwrap()));
    let (snapshotter, ..) = snapshotter(inspector, ConfigurationMode::Static);

    let snapshot = snapshotter.capture().await;

    assert_eq!(snapshot.interface_name, "eth0");
    assert_eq!(snapshot.gateway_address, None);
}

#[tokio::test]
async fn renewal_to_a_new_address_is_a_change() {
    let inspector = FakeInspector::new(vec![lo(), eth0(10)]);
    inspector.set_route("eth0", Some("192.168.1.1".parse().unwrap()));
    let (snapshotter, inspector, _backend, clock) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let a = snapshotter.capture().await;
    inspector.set_interfaces(vec![lo(), eth0(50)]);
    clock.advance(std::time::Duration::from_secs(30));
    let b = snapshotter.capture().await;

    assert_eq!(a.ip_address, Some("192.168.1.10".parse().unwrap()));
    assert_eq!(b.ip_address, Some("192.168.1.50".parse().unwrap()));
    assert!(compare::has_changed(&a, &b));
    assert_eq!(compare::changes(&a, &b), vec!["address 192.168.1.10 -> 192.168.1.50"]);
}

#[tokio::test]
async fn recapture_of_an_unchanged_host_is_not_a_change() {
    let inspector = FakeInspector::new(vec![lo(), eth0(10)]);
    let (snapshotter, inspector, _backend, clock) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let a = snapshotter.capture().await;
    clock.advance(std::time::Duration::from_secs(30));
    inspector.set_dns(vec!["9.9.9.9".parse().unwrap()]);
    let b = snapshotter.capture().await;

    assert_ne!(a.captured_at, b.captured_at);
    assert!(!compare::has_changed(&a, &b));
}

#[tokio::test]
async fn lost_route_is_a_change() {
    let inspector = FakeInspector::new(vec![lo(), eth0(10)]);
    inspector.set_route("eth0", Some("192.168.1.1".parse().unwrap()));
    let (snapshotter, inspector, ..) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let a = snapshotter.capture().await;
    inspector.clear_route();
    let b = snapshotter.capture().await;

    assert!(compare::has_changed(&a, &b));
}
