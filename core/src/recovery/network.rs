use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{RemediationStep, StepOutcome};
use crate::backend::NetworkBackend;

/// Restarts the host network stack and gives DHCP time to finish.
pub struct RestartNetwork {
    backend: Arc<dyn NetworkBackend>,
    settle: Duration,
}

impl RestartNetwork {
    pub fn new(backend: Arc<dyn NetworkBackend>, settle: Duration) -> Self {
        Self { backend, settle }
    }
}

#[async_trait]
impl RemediationStep for RestartNetwork {
    fn name(&self) -> &'static str {
        "restart network"
    }

    async fn run(&self) -> StepOutcome {
        let outcome = self.backend.restart().await;
        if !outcome.status.is_failure() && !self.settle.is_zero() {
            debug!("Waiting {}s for {} to settle", self.settle.as_secs(), self.backend.kind());
            tokio::time::sleep(self.settle).await;
        }
        outcome
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
