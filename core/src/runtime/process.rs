use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sysinfo::{ProcessExt, System, SystemExt};
use tracing::warn;

use nanowatch_common::config::ServiceConfig;

use super::ServiceRuntime;
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, run_lenient};

/// Services started as plain processes, restarted through their configured shell command.
pub struct ProcessRuntime {
    runner: Arc<dyn CommandRunner>,
    limit: Duration,
}

impl ProcessRuntime {
    pub fn new(runner: Arc<dyn CommandRunner>, limit: Duration) -> Self {
        Self { runner, limit }
    }
}

#[async_trait]
impl ServiceRuntime for ProcessRuntime {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn is_running(&self, service: &ServiceConfig) -> bool {
        let name = service.process_name().to_string();
        match tokio::task::spawn_blocking(move || process_exists(&name)).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Process lookup failed: {e}");
                false
            }
        }
    }

    async fn restart_all(&self, services: &[ServiceConfig]) -> StepOutcome {
        let mut outcomes = Vec::with_capacity(services.len());
        for service in services {
            let Some(command) = service.restart_command.as_deref() else {
                outcomes.push(StepOutcome::skipped(format!("no restart command for {}", service.id)));
                continue;
            };
            let output = run_lenient(self.runner.as_ref(), "sh", &["-c", command], self.limit).await;
            outcomes.push(StepOutcome::from_output(&format!("restarted {}", service.id), &output));
        }
        StepOutcome::combine(outcomes)
    }
}

fn process_exists(name: &str) -> bool {
    let mut system = System::new();
    system.refresh_processes();
    system.processes_by_exact_name(name).next().is_some()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
