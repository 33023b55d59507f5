use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use nanowatch_common::config::ServiceConfig;

use super::{ServiceRuntime, last_lines};
use crate::recovery::StepOutcome;
use crate::runner::{CommandOutput, CommandRunner, run_lenient};

const INSPECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DockerRuntime {
    runner: Arc<dyn CommandRunner>,
    compose_file: Option<PathBuf>,
    limit: Duration,
}

impl DockerRuntime {
    pub fn new(runner: Arc<dyn CommandRunner>, compose_file: Option<PathBuf>, limit: Duration) -> Self {
        Self {
            runner,
            compose_file,
            limit,
        }
    }

    /// `docker compose` plugin first, the standalone `docker-compose` binary second.
    async fn compose_recreate(&self, file: &str) -> CommandOutput {
        let args = ["compose", "-f", file, "up", "-d", "--force-recreate"];
        let output = run_lenient(self.runner.as_ref(), "docker", &args, self.limit).await;
        if output.success || !self.runner.exists("docker-compose") {
            return output;
        }
        debug!("docker compose failed ({}), trying docker-compose", output.summary());
        run_lenient(
            self.runner.as_ref(),
            "docker-compose",
            &["-f", file, "up", "-d", "--force-recreate"],
            self.limit,
        )
        .await
    }
}

#[async_trait]
impl ServiceRuntime for DockerRuntime {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn is_running(&self, service: &ServiceConfig) -> bool {
        let output = run_lenient(
            self.runner.as_ref(),
            "docker",
            &["inspect", "-f", "{{.State.Running}}", service.container_name()],
            INSPECT_TIMEOUT,
        )
        .await;
        output.success && output.stdout.trim() == "true"
    }

    async fn restart_all(&self, services: &[ServiceConfig]) -> StepOutcome {
        if services.is_empty() {
            return StepOutcome::skipped("no managed services");
        }

        if let Some(file) = &self.compose_file {
            let file = file.to_string_lossy();
            let output = self.compose_recreate(&file).await;
            return StepOutcome::from_output(&format!("recreated containers from {file}"), &output);
        }

        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(services.len());
        for service in services {
            let container = service.container_name();
            let output = run_lenient(self.runner.as_ref(), "docker", &["restart", container], self.limit).await;
            outcomes.push(StepOutcome::from_output(&format!("restarted {container}"), &output));
        }
        StepOutcome::combine(outcomes)
    }

    /// `docker logs --tail`; the container's stderr is part of its log.
    async fn recent_logs(&self, service: &ServiceConfig, lines: usize) -> Option<Vec<String>> {
        let tail = lines.to_string();
        let output = run_lenient(
            self.runner.as_ref(),
            "docker",
            &["logs", "--tail", &tail, service.container_name()],
            INSPECT_TIMEOUT,
        )
        .await;
        if !output.success {
            debug!("docker logs {}: {}", service.container_name(), output.summary());
            return None;
        }
        Some(last_lines(&format!("{}\n{}", output.stdout, output.stderr), lines))
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
