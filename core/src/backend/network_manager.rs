use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use nanowatch_common::models::ConfigurationMode;

use super::{BackendKind, NetworkBackend, restart_unit};
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, run_lenient};

pub struct NetworkManager {
    runner: Arc<dyn CommandRunner>,
    /// Mode queries run on every cycle and must stay short.
    query_limit: Duration,
    restart_limit: Duration,
}

impl NetworkManager {
    pub fn new(runner: Arc<dyn CommandRunner>, query_limit: Duration, restart_limit: Duration) -> Self {
        Self {
            runner,
            query_limit,
            restart_limit,
        }
    }

    async fn active_connection(&self, interface: &str) -> Option<String> {
        let output = run_lenient(
            self.runner.as_ref(),
            "nmcli",
            &["-t", "-f", "GENERAL.CONNECTION", "device", "show", interface],
            self.query_limit,
        )
        .await;
        if !output.success {
            debug!("nmcli device show {interface}: {}", output.summary());
            return None;
        }
        parse_device_connection(&output.stdout)
    }
}

#[async_trait]
impl NetworkBackend for NetworkManager {
    fn kind(&self) -> BackendKind {
        BackendKind::NetworkManager
    }

    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode {
        let Some(connection) = self.active_connection(interface).await else {
            return ConfigurationMode::Unknown;
        };
        let output = run_lenient(
            self.runner.as_ref(),
            "nmcli",
            &["-g", "ipv4.method", "connection", "show", &connection],
            self.query_limit,
        )
        .await;
        if !output.success {
            return ConfigurationMode::Unknown;
        }
        mode_from_method(&output.stdout)
    }

    async fn restart(&self) -> StepOutcome {
        restart_unit(self.runner.as_ref(), "NetworkManager", self.restart_limit).await
    }
}

/// `GENERAL.CONNECTION:Wired connection 1` -> `Wired connection 1`
pub fn parse_device_connection(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("GENERAL.CONNECTION:"))
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "--")
        .map(str::to_string)
}

/// Maps `ipv4.method` to a configuration mode.
pub fn mode_from_method(method: &str) -> ConfigurationMode {
    match method.trim() {
        "auto" => ConfigurationMode::Dhcp,
        "manual" => ConfigurationMode::Static,
        _ => ConfigurationMode::Unknown,
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
