//! Host network stacks.
//!
//! A Nano Pi image may be driven by any of NetworkManager, netplan, systemd-networkd,
//! dhcpcd or ifupdown. Exactly one [`NetworkBackend`] is selected at startup by probing
//! which of them is present, and every later query or restart goes through it.

pub mod dhcpcd;
pub mod ifupdown;
pub mod netplan;
pub mod network_manager;
pub mod networkd;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use nanowatch_common::config::{BackendPreference, Config};
use nanowatch_common::error::StartupError;
use nanowatch_common::models::ConfigurationMode;

use crate::recovery::StepOutcome;
use crate::runner::{self, CommandRunner};

use dhcpcd::Dhcpcd;
use ifupdown::Ifupdown;
use netplan::Netplan;
use network_manager::NetworkManager;
use networkd::Networkd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    NetworkManager,
    Netplan,
    SystemdNetworkd,
    Dhcpcd,
    Ifupdown,
}

impl BackendKind {
    /// Detection order.
    pub const ALL: [BackendKind; 5] = [
        BackendKind::NetworkManager,
        BackendKind::Netplan,
        BackendKind::SystemdNetworkd,
        BackendKind::Dhcpcd,
        BackendKind::Ifupdown,
    ];

    fn from_preference(preference: BackendPreference) -> Option<Self> {
        match preference {
            BackendPreference::Auto => None,
            BackendPreference::NetworkManager => Some(BackendKind::NetworkManager),
            BackendPreference::Netplan => Some(BackendKind::Netplan),
            BackendPreference::SystemdNetworkd => Some(BackendKind::SystemdNetworkd),
            BackendPreference::Dhcpcd => Some(BackendKind::Dhcpcd),
            BackendPreference::Ifupdown => Some(BackendKind::Ifupdown),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendKind::NetworkManager => "NetworkManager",
            BackendKind::Netplan => "netplan",
            BackendKind::SystemdNetworkd => "systemd-networkd",
            BackendKind::Dhcpcd => "dhcpcd",
            BackendKind::Ifupdown => "ifupdown",
        };
        f.write_str(label)
    }
}

#[async_trait]
pub trait NetworkBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// How `interface` gets its address. `Unknown` when the backend cannot tell.
    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode;

    /// Restarts the network stack.
    async fn restart(&self) -> StepOutcome;
}

/// Selects the backend to use on this host.
///
/// With an explicit preference only that backend is probed.
pub async fn detect(runner: Arc<dyn CommandRunner>, config: &Config) -> Result<Arc<dyn NetworkBackend>, StartupError> {
    let candidates: Vec<BackendKind> = match BackendKind::from_preference(config.network.backend) {
        Some(kind) => vec![kind],
        None => BackendKind::ALL.to_vec(),
    };

    for kind in &candidates {
        if is_present(*kind, runner.as_ref(), config).await {
            info!("Using {kind} network backend");
            return Ok(build(*kind, Arc::clone(&runner), config));
        }
        debug!("{kind} not present");
    }

    match BackendKind::from_preference(config.network.backend) {
        Some(kind) => Err(StartupError::BackendUnavailable(kind.to_string())),
        None => Err(StartupError::NoBackend(
            candidates.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        )),
    }
}

fn build(kind: BackendKind, runner: Arc<dyn CommandRunner>, config: &Config) -> Arc<dyn NetworkBackend> {
    let query = config.probe_timeout();
    let limit = config.command_timeout();
    match kind {
        BackendKind::NetworkManager => Arc::new(NetworkManager::new(runner, query, limit)),
        BackendKind::Netplan => Arc::new(Netplan::new(runner, config.network.netplan_dir.clone(), limit)),
        BackendKind::SystemdNetworkd => Arc::new(Networkd::new(runner, query, limit)),
        BackendKind::Dhcpcd => Arc::new(Dhcpcd::new(runner, config.network.dhcpcd_conf.clone(), limit)),
        BackendKind::Ifupdown => Arc::new(Ifupdown::new(runner, config.network.interfaces_file.clone(), limit)),
    }
}

async fn is_present(kind: BackendKind, runner: &dyn CommandRunner, config: &Config) -> bool {
    let probe = config.probe_timeout();
    match kind {
        BackendKind::NetworkManager => {
            runner.exists("nmcli") && runner::is_unit_active(runner, "NetworkManager", probe).await
        }
        BackendKind::Netplan => runner.exists("netplan") && netplan::has_config(&config.network.netplan_dir).await,
        BackendKind::SystemdNetworkd => {
            runner.exists("networkctl") && runner::is_unit_active(runner, "systemd-networkd", probe).await
        }
        BackendKind::Dhcpcd => {
            runner.exists("dhcpcd")
                && (runner::is_unit_active(runner, "dhcpcd", probe).await
                    || tokio::fs::try_exists(&config.network.dhcpcd_conf).await.unwrap_or(false))
        }
        BackendKind::Ifupdown => {
            runner.exists("ifup") && tokio::fs::try_exists(&config.network.interfaces_file).await.unwrap_or(false)
        }
    }
}

/// `systemctl restart <unit>`
pub(crate) async fn restart_unit(runner: &dyn CommandRunner, unit: &str, limit: Duration) -> StepOutcome {
    if !runner.exists("systemctl") {
        return StepOutcome::failed(format!("cannot restart {unit}: systemctl not found"));
    }
    let output = runner::run_lenient(runner, "systemctl", &["restart", unit], limit).await;
    StepOutcome::from_output(&format!("restarted {unit}"), &output)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
