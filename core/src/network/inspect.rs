//! Read-only inspection of the host's network state.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::{self, NetworkInterface};
use tracing::debug;

use nanowatch_common::config::Config;

use crate::network::reachability;
use crate::runner::CommandRunner;

const RTF_UP: u32 = 0x0001;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoute {
    pub interface: String,
    pub gateway: Option<IpAddr>,
}

/// Source of raw network facts for the snapshotter.
///
/// Implementations must not fail: unknown values are reported as empty.
#[async_trait]
pub trait NetworkInspector: Send + Sync {
    fn interfaces(&self) -> Vec<NetworkInterface>;
    async fn default_route(&self) -> Option<DefaultRoute>;
    async fn dns_servers(&self) -> Vec<IpAddr>;
    async fn internet_reachable(&self) -> bool;
}

pub struct SystemInspector {
    runner: Arc<dyn CommandRunner>,
    route_table: PathBuf,
    resolv_conf: PathBuf,
    reachability_target: IpAddr,
    reachability_port: u16,
    probe_timeout: Duration,
}

impl SystemInspector {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Self {
        Self {
            runner,
            route_table: config.network.route_table.clone(),
            resolv_conf: config.dns.resolv_conf.clone(),
            reachability_target: config.network.reachability_target,
            reachability_port: config.network.reachability_port,
            probe_timeout: config.probe_timeout(),
        }
    }
}

#[async_trait]
impl NetworkInspector for SystemInspector {
    fn interfaces(&self) -> Vec<NetworkInterface> {
        datalink::interfaces()
    }

    async fn default_route(&self) -> Option<DefaultRoute> {
        match tokio::fs::read_to_string(&self.route_table).await {
            Ok(content) => parse_route_table(&content),
            Err(e) => {
                debug!("Cannot read {}: {e}", self.route_table.display());
                None
            }
        }
    }

    async fn dns_servers(&self) -> Vec<IpAddr> {
        match tokio::fs::read_to_string(&self.resolv_conf).await {
            Ok(content) => parse_resolv_conf(&content),
            Err(e) => {
                debug!("Cannot read {}: {e}", self.resolv_conf.display());
                Vec::new()
            }
        }
    }

    async fn internet_reachable(&self) -> bool {
        reachability::is_reachable(
            self.runner.as_ref(),
            self.reachability_target,
            self.reachability_port,
            self.probe_timeout,
        )
        .await
    }
}

/// Picks the lowest-metric default route from `/proc/net/route`.
pub fn parse_route_table(content: &str) -> Option<DefaultRoute> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                return None;
            }
            let (interface, destination, gateway, flags, metric, mask) =
                (fields[0], fields[1], fields[2], fields[3], fields[6], fields[7]);

            let flags = u32::from_str_radix(flags, 16).ok()?;
            if destination != "00000000" || mask != "00000000" || flags & RTF_UP == 0 {
                return None;
            }

            let metric: u32 = metric.parse().unwrap_or(u32::MAX);
            let gateway = parse_hex_ipv4(gateway)
                .filter(|gw| !gw.is_unspecified())
                .map(IpAddr::V4);

            Some((metric, DefaultRoute { interface: interface.to_string(), gateway }))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, route)| route)
}

/// `/proc/net/route` stores addresses as little-endian hex.
fn parse_hex_ipv4(hex: &str) -> Option<Ipv4Addr> {
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(value.to_le_bytes()))
}

/// Nameservers in file order, without duplicates.
pub fn parse_resolv_conf(content: &str) -> Vec<IpAddr> {
    let mut servers: Vec<IpAddr> = Vec::new();
    for line in content.lines() {
        let line = line.split(['#', ';']).next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        if parts.next() != Some("nameserver") {
            continue;
        }
        let Some(value) = parts.next() else {
            continue;
        };
        // fe80::1%eth0
        let address = value.split('%').next().unwrap_or(value);
        if let Ok(ip) = address.parse::<IpAddr>() {
            if !servers.contains(&ip) {
                servers.push(ip);
            }
        }
    }
    servers
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
