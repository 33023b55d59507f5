use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use nanowatch_common::models::ConfigurationMode;

use super::{BackendKind, NetworkBackend, restart_unit};
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, run_lenient};

pub struct Ifupdown {
    runner: Arc<dyn CommandRunner>,
    interfaces_file: PathBuf,
    limit: Duration,
}

impl Ifupdown {
    pub fn new(runner: Arc<dyn CommandRunner>, interfaces_file: PathBuf, limit: Duration) -> Self {
        Self {
            runner,
            interfaces_file,
            limit,
        }
    }
}

#[async_trait]
impl NetworkBackend for Ifupdown {
    fn kind(&self) -> BackendKind {
        BackendKind::Ifupdown
    }

    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode {
        match tokio::fs::read_to_string(&self.interfaces_file).await {
            Ok(content) => parse_interfaces(&content, interface),
            Err(e) => {
                debug!("Cannot read {}: {e}", self.interfaces_file.display());
                ConfigurationMode::Unknown
            }
        }
    }

    async fn restart(&self) -> StepOutcome {
        if self.runner.exists("systemctl") {
            return restart_unit(self.runner.as_ref(), "networking", self.limit).await;
        }
        let down = run_lenient(self.runner.as_ref(), "ifdown", &["-a"], self.limit).await;
        if !down.success {
            debug!("ifdown -a: {}", down.summary());
        }
        let up = run_lenient(self.runner.as_ref(), "ifup", &["-a"], self.limit).await;
        StepOutcome::from_output("re-raised interfaces with ifup -a", &up)
    }
}

/// Finds `iface <name> inet <method>` in `/etc/network/interfaces`.
pub fn parse_interfaces(content: &str, interface: &str) -> ConfigurationMode {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            match (words.next(), words.next(), words.next(), words.next()) {
                (Some("iface"), Some(name), Some("inet"), Some(method)) if name == interface => Some(method),
                _ => None,
            }
        })
        .last()
        .map(|method| match method {
            "dhcp" => ConfigurationMode::Dhcp,
            "static" => ConfigurationMode::Static,
            _ => ConfigurationMode::Unknown,
        })
        .unwrap_or(ConfigurationMode::Unknown)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
