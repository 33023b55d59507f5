use pnet::datalink::NetworkInterface;

use nanowatch_common::network::interface::{Selection, select_primary_interface};

use crate::util::{docker0, eth0, eth0_without_address, lo, veth1234, wlan0};

/*************************************************************
                 Primary interface selection
**************************************************************/

#[test]
fn default_route_wins_over_wired() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), eth0(10), wlan0()];
    let selected = select_primary_interface(&interfaces, Some("wlan0"), None).unwrap();
    assert_eq!(selected.interface, wlan0());
    assert_eq!(selected.selection, Selection::DefaultRoute);
}

#[test]
fn wired_preferred_without_route() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), docker0(), wlan0(), eth0(10)];
    let selected = select_primary_interface(&interfaces, None, None).unwrap();
    assert_eq!(selected.interface, eth0(10));
    assert_eq!(selected.selection, Selection::FirstAddressed);
}

#[test]
fn container_interfaces_are_never_primary() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), docker0(), veth1234()];
    let selected = select_primary_interface(&interfaces, None, None);
    assert!(selected.is_none(), "Expected no interface, received: {selected:?}");
}

#[test]
fn fallback_used_when_nothing_has_an_address() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), eth0_without_address()];
    let selected = select_primary_interface(&interfaces, None, Some("eth0")).unwrap();
    assert_eq!(selected.interface.name, "eth0");
    assert_eq!(selected.selection, Selection::Fallback);
}

#[test]
fn missing_fallback_is_ignored() {
    let interfaces: Vec<NetworkInterface> = vec![lo()];
    assert!(select_primary_interface(&interfaces, None, Some("eth1")).is_none());
}

#[test]
fn route_through_unknown_interface_falls_through() {
    let interfaces: Vec<NetworkInterface> = vec![lo(), eth0(10)];
    let selected = select_primary_interface(&interfaces, Some("ppp0"), None).unwrap();
    assert_eq!(selected.interface.name, "eth0");
    assert_eq!(selected.selection, Selection::FirstAddressed);
}
