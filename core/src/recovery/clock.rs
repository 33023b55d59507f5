use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{RemediationStep, StepOutcome};
use crate::runner::{CommandRunner, run_lenient};

/// Forces a time sync. TLS and registry pulls fail on a skewed clock.
pub struct ResyncClock {
    runner: Arc<dyn CommandRunner>,
    ntp_server: String,
    limit: Duration,
}

impl ResyncClock {
    pub fn new(runner: Arc<dyn CommandRunner>, ntp_server: impl Into<String>, limit: Duration) -> Self {
        Self {
            runner,
            ntp_server: ntp_server.into(),
            limit,
        }
    }

    /// `timedatectl set-ntp false` then `true` restarts the NTP client.
    async fn toggle_ntp(&self) -> bool {
        if !self.runner.exists("timedatectl") {
            return false;
        }
        let off = run_lenient(self.runner.as_ref(), "timedatectl", &["set-ntp", "false"], self.limit).await;
        let on = run_lenient(self.runner.as_ref(), "timedatectl", &["set-ntp", "true"], self.limit).await;
        if !off.success || !on.success {
            debug!("timedatectl set-ntp: {}", if on.success { off.summary() } else { on.summary() });
        }
        on.success
    }

    async fn force_sync(&self) -> Option<(String, bool, String)> {
        let server = self.ntp_server.as_str();
        let candidates: [(&str, Vec<&str>); 3] = [
            ("ntpdate", vec!["-u", server]),
            ("ntpsec-ntpdate", vec!["-u", server]),
            ("chronyc", vec!["makestep"]),
        ];

        for (program, args) in candidates {
            if !self.runner.exists(program) {
                continue;
            }
            let output = run_lenient(self.runner.as_ref(), program, &args, self.limit).await;
            return Some((program.to_string(), output.success, output.summary()));
        }
        None
    }
}

#[async_trait]
impl RemediationStep for ResyncClock {
    fn name(&self) -> &'static str {
        "resync clock"
    }

    async fn run(&self) -> StepOutcome {
        let toggled = self.toggle_ntp().await;

        let outcome = match self.force_sync().await {
            Some((program, true, _)) => StepOutcome::succeeded(format!("synchronized with {program}")),
            Some((program, false, summary)) => StepOutcome::failed(format!("{program} failed: {summary}")),
            None if toggled => StepOutcome::succeeded("restarted NTP through timedatectl"),
            None => return StepOutcome::skipped("no time synchronization tool available"),
        };

        if !outcome.status.is_failure() && self.runner.exists("hwclock") {
            let output = run_lenient(self.runner.as_ref(), "hwclock", &["--systohc"], self.limit).await;
            if !output.success {
                // boards without an RTC
                debug!("hwclock --systohc: {}", output.summary());
            }
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
