//! Managers that run the managed services.

pub mod docker;
pub mod process;
pub mod systemd;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use nanowatch_common::config::{Config, RuntimeKind, ServiceConfig};

use crate::recovery::StepOutcome;
use crate::runner::CommandRunner;

use docker::DockerRuntime;
use process::ProcessRuntime;
use systemd::SystemdRuntime;

#[async_trait]
pub trait ServiceRuntime: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the container, unit or process of `service` is alive.
    async fn is_running(&self, service: &ServiceConfig) -> bool;

    /// Recreates or restarts every service so it binds to the current network.
    async fn restart_all(&self, services: &[ServiceConfig]) -> StepOutcome;

    /// The last `lines` log lines of `service`, or `None` when this runtime keeps no logs.
    async fn recent_logs(&self, _service: &ServiceConfig, _lines: usize) -> Option<Vec<String>> {
        None
    }
}

/// Log tails for every service that has any.
pub async fn log_tails(
    runtime: &dyn ServiceRuntime,
    services: &[ServiceConfig],
    lines: usize,
) -> BTreeMap<String, Vec<String>> {
    let mut tails = BTreeMap::new();
    if lines == 0 {
        return tails;
    }
    for service in services {
        if let Some(tail) = runtime.recent_logs(service, lines).await {
            tails.insert(service.id.clone(), tail);
        }
    }
    tails
}

/// The last `count` non-blank lines of `text`.
pub(crate) fn last_lines(text: &str, count: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(count)..]
        .iter()
        .map(|line| line.to_string())
        .collect()
}

pub fn from_config(runner: Arc<dyn CommandRunner>, config: &Config) -> Arc<dyn ServiceRuntime> {
    let limit = config.command_timeout();
    match config.runtime.kind {
        RuntimeKind::Docker => Arc::new(DockerRuntime::new(runner, config.runtime.compose_file.clone(), limit)),
        RuntimeKind::Systemd => Arc::new(SystemdRuntime::new(runner, limit)),
        RuntimeKind::Process => Arc::new(ProcessRuntime::new(runner, limit)),
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
