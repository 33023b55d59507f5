use std::net::{IpAddr, Ipv6Addr};

use chrono::{DateTime, Local, Utc};
use colored::*;

use nanowatch_common::models::{
    ConfigurationMode, HealthState, NetworkSnapshot, RecoveryAttempt, ServiceHealth, StepReport, StepStatus,
};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn ipv6_to_type_str(ipv6_addr: &Ipv6Addr) -> &'static str {
    let first_byte = ipv6_addr.octets()[0];
    if (0x20..=0x3F).contains(&first_byte) {
        return "GUA";
    }
    if ipv6_addr.is_unique_local() {
        return "ULA";
    }
    if ipv6_addr.is_unicast_link_local() {
        return "LLA";
    }
    "IPv6"
}

pub fn address(ip: &IpAddr, prefix: Option<u8>) -> ColoredString {
    let (addr_color, prefix_color) = match ip {
        IpAddr::V4(_) => (colors::IPV4_ADDR, colors::IPV4_PREFIX),
        IpAddr::V6(_) => (colors::IPV6_ADDR, colors::IPV6_PREFIX),
    };
    let address: ColoredString = ip.to_string().color(addr_color);
    match prefix {
        Some(prefix) => format!("{address}/{}", prefix.to_string().color(prefix_color)).color(colors::SEPARATOR),
        None => address,
    }
}

fn address_key(ip: &IpAddr) -> &'static str {
    match ip {
        IpAddr::V4(_) => "IPv4",
        IpAddr::V6(ipv6_addr) => ipv6_to_type_str(ipv6_addr),
    }
}

pub fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn yes_no(value: bool) -> ColoredString {
    if value { "yes".color(colors::GOOD) } else { "no".color(colors::BAD) }
}

pub fn mode(mode: ConfigurationMode) -> ColoredString {
    match mode {
        ConfigurationMode::Unknown => mode.to_string().color(colors::WARN),
        _ => mode.to_string().color(colors::ACCENT),
    }
}

pub fn snapshot_details(snapshot: &NetworkSnapshot) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();

    match &snapshot.ip_address {
        Some(ip) => details.push((address_key(ip).to_string(), address(ip, snapshot.prefix_len))),
        None => details.push(("Address".to_string(), "none".color(colors::BAD))),
    }

    let gateway: ColoredString = match &snapshot.gateway_address {
        Some(gateway) => address(gateway, None),
        None => "none".color(colors::WARN),
    };
    details.push(("Gateway".to_string(), gateway));

    let dns: ColoredString = if snapshot.dns_servers.is_empty() {
        "none".color(colors::WARN)
    } else {
        snapshot
            .dns_servers
            .iter()
            .map(|server| server.to_string())
            .collect::<Vec<_>>()
            .join(", ")
            .normal()
    };
    details.push(("DNS".to_string(), dns));
    details.push(("Mode".to_string(), mode(snapshot.configuration_mode)));
    details.push(("Internet".to_string(), yes_no(snapshot.internet_reachable)));
    details.push(("Captured".to_string(), local_time(&snapshot.captured_at).normal()));

    details
}

pub fn health_state(state: HealthState) -> ColoredString {
    match state {
        HealthState::Healthy => state.to_string().color(colors::GOOD).bold(),
        HealthState::Degraded => state.to_string().color(colors::BAD).bold(),
    }
}

pub fn service_details(health: &ServiceHealth) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("State".to_string(), health_state(health.state())),
        ("Running".to_string(), yes_no(health.is_running)),
        ("Responds".to_string(), yes_no(health.is_responding)),
    ];

    if health.consecutive_failures > 0 {
        details.push((
            "Failures".to_string(),
            health.consecutive_failures.to_string().color(colors::BAD),
        ));
    }
    if let Some(error) = &health.last_error {
        details.push(("Error".to_string(), error.as_str().color(colors::WARN)));
    }
    if let Some(at) = &health.last_check_at {
        details.push(("Checked".to_string(), local_time(at).normal()));
    }

    details
}

pub fn step_status(status: StepStatus) -> ColoredString {
    match status {
        StepStatus::Succeeded => "ok".color(colors::GOOD).bold(),
        StepStatus::Skipped => "skipped".color(colors::SEPARATOR),
        StepStatus::Failed => "failed".color(colors::BAD).bold(),
    }
}

pub fn step_details(steps: &[StepReport]) -> Vec<Detail> {
    steps
        .iter()
        .enumerate()
        .map(|(idx, report)| {
            let value = format!("{} {}", step_status(report.status), report.detail.color(colors::TEXT_DEFAULT));
            (format!("{}. {}", idx + 1, report.step), value.normal())
        })
        .collect()
}

pub fn attempt(attempt: &RecoveryAttempt) -> ColoredString {
    let outcome: ColoredString = if attempt.succeeded {
        "succeeded".color(colors::GOOD)
    } else {
        "had failures".color(colors::BAD)
    };
    format!("{} ({}) {}", local_time(&attempt.triggered_at), attempt.trigger_reason, outcome).normal()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
