use std::sync::Arc;

use async_trait::async_trait;

use nanowatch_common::config::ServiceConfig;

use super::{RemediationStep, StepOutcome};
use crate::runtime::ServiceRuntime;

/// Recreates the managed services so they bind to the current address.
pub struct RestartServices {
    runtime: Arc<dyn ServiceRuntime>,
    services: Vec<ServiceConfig>,
}

impl RestartServices {
    pub fn new(runtime: Arc<dyn ServiceRuntime>, services: Vec<ServiceConfig>) -> Self {
        Self { runtime, services }
    }
}

#[async_trait]
impl RemediationStep for RestartServices {
    fn name(&self) -> &'static str {
        "restart services"
    }

    async fn run(&self) -> StepOutcome {
        if self.services.is_empty() {
            return StepOutcome::skipped("no managed services");
        }
        self.runtime.restart_all(&self.services).await
    }
}
