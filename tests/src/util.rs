use pnet::datalink::{MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use std::net::{Ipv4Addr, Ipv6Addr};

pub const IFF_UP: u32 = 1;
pub const IFF_BROADCAST: u32 = 1 << 1;
pub const IFF_LOOPBACK: u32 = 1 << 3;

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

pub fn v6(s: &str, p: u8) -> IpNetwork {
    IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
}

/*************************************************************
                  Mock interfaces for testing
**************************************************************/

pub fn lo() -> NetworkInterface {
    ni("lo", 1, None, &[v4(127, 0, 0, 1, 8), v6("::1", 128)], IFF_UP | IFF_LOOPBACK)
}

pub fn eth0(host: u8) -> NetworkInterface {
    ni(
        "eth0",
        2,
        Some(MacAddr(0x02, 0x81, 0x3c, 0x11, 0x22, 0x33)),
        &[v4(192, 168, 1, host, 24), v6("fe80::81:3cff:fe11:2233", 64)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn eth0_without_address() -> NetworkInterface {
    ni("eth0", 2, Some(MacAddr(0x02, 0x81, 0x3c, 0x11, 0x22, 0x33)), &[], IFF_BROADCAST)
}

pub fn wlan0() -> NetworkInterface {
    ni(
        "wlan0",
        3,
        Some(MacAddr(0x02, 0x44, 0x55, 0x66, 0x77, 0x88)),
        &[v4(10, 0, 0, 23, 24)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn docker0() -> NetworkInterface {
    ni(
        "docker0",
        4,
        Some(MacAddr(0x02, 0x42, 0xac, 0x11, 0x00, 0x01)),
        &[v4(172, 17, 0, 1, 16)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn veth1234() -> NetworkInterface {
    ni(
        "veth1234",
        5,
        Some(MacAddr(0x02, 0x42, 0xac, 0x11, 0x00, 0x02)),
        &[v6("fe80::42:acff:fe11:2", 64)],
        IFF_UP | IFF_BROADCAST,
    )
}
