use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use nanowatch_common::models::ConfigurationMode;

use super::{BackendKind, NetworkBackend, restart_unit};
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, run_lenient};

pub struct Networkd {
    runner: Arc<dyn CommandRunner>,
    /// Mode queries run on every cycle and must stay short.
    query_limit: Duration,
    restart_limit: Duration,
}

impl Networkd {
    pub fn new(runner: Arc<dyn CommandRunner>, query_limit: Duration, restart_limit: Duration) -> Self {
        Self {
            runner,
            query_limit,
            restart_limit,
        }
    }
}

#[async_trait]
impl NetworkBackend for Networkd {
    fn kind(&self) -> BackendKind {
        BackendKind::SystemdNetworkd
    }

    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode {
        let output = run_lenient(
            self.runner.as_ref(),
            "networkctl",
            &["status", "--no-pager", interface],
            self.query_limit,
        )
        .await;
        if !output.success {
            return ConfigurationMode::Unknown;
        }
        parse_status(&output.stdout)
    }

    async fn restart(&self) -> StepOutcome {
        restart_unit(self.runner.as_ref(), "systemd-networkd", self.restart_limit).await
    }
}

/// Reads the mode out of `networkctl status <link>`.
///
/// DHCP leases are annotated as `(DHCP4 via ...)` or `(DHCPv4 via ...)` depending on the
/// systemd version. A managed link with addresses but no lease is static.
pub fn parse_status(output: &str) -> ConfigurationMode {
    let mut managed = false;
    let mut has_address = false;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Address" if value.contains("DHCP4") || value.contains("DHCPv4") => return ConfigurationMode::Dhcp,
            "Address" => has_address = true,
            "Network File" => managed = value != "n/a",
            "State" if value.contains("unmanaged") => return ConfigurationMode::Unknown,
            _ => {}
        }
    }

    if output.contains("DHCP4 Client") {
        return ConfigurationMode::Dhcp;
    }
    if managed && has_address {
        ConfigurationMode::Static
    } else {
        ConfigurationMode::Unknown
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
