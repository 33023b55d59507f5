use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use nanowatch_common::config::ServiceConfig;

use super::{ServiceRuntime, last_lines};
use crate::backend::restart_unit;
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, is_unit_active, run_lenient};

const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SystemdRuntime {
    runner: Arc<dyn CommandRunner>,
    limit: Duration,
}

impl SystemdRuntime {
    pub fn new(runner: Arc<dyn CommandRunner>, limit: Duration) -> Self {
        Self { runner, limit }
    }
}

#[async_trait]
impl ServiceRuntime for SystemdRuntime {
    fn name(&self) -> &'static str {
        "systemd"
    }

    async fn is_running(&self, service: &ServiceConfig) -> bool {
        is_unit_active(self.runner.as_ref(), &service.unit_name(), STATUS_TIMEOUT).await
    }

    async fn restart_all(&self, services: &[ServiceConfig]) -> StepOutcome {
        let mut outcomes = Vec::with_capacity(services.len());
        for service in services {
            outcomes.push(restart_unit(self.runner.as_ref(), &service.unit_name(), self.limit).await);
        }
        StepOutcome::combine(outcomes)
    }

    async fn recent_logs(&self, service: &ServiceConfig, lines: usize) -> Option<Vec<String>> {
        if !self.runner.exists("journalctl") {
            return None;
        }
        let unit = service.unit_name();
        let count = lines.to_string();
        let output = run_lenient(
            self.runner.as_ref(),
            "journalctl",
            &["-u", &unit, "-n", &count, "--no-pager", "-o", "cat"],
            STATUS_TIMEOUT,
        )
        .await;
        output.success.then(|| last_lines(&output.stdout, lines))
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
