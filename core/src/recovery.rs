//! The remediation pipeline.
//!
//! A recovery runs a fixed, ordered list of [`RemediationStep`]s. Steps never abort the
//! pipeline: each one reports a [`StepOutcome`] that is logged and aggregated, and the next
//! step runs regardless.
//!
//! Two guards keep recoveries from piling up:
//! * only one recovery is in flight at a time; a trigger arriving mid-recovery is dropped,
//! * a new recovery may not start within the cooldown of the previous one's start.

pub mod clock;
pub mod dns;
pub mod host_env;
pub mod network;
pub mod services;

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{error, info, warn};

use nanowatch_common::clock::Clock;
use nanowatch_common::models::{RecoveryAttempt, StepReport, StepStatus, TriggerReason};
use nanowatch_common::success;

use crate::runner::CommandOutput;

const HISTORY_LEN: usize = 20;

/// What a single step achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub detail: String,
}

impl StepOutcome {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Succeeded,
            detail: detail.into(),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Skipped,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            detail: detail.into(),
        }
    }

    /// Maps a finished command to an outcome described as `action`.
    pub fn from_output(action: &str, output: &CommandOutput) -> Self {
        if output.success {
            Self::succeeded(action.to_string())
        } else {
            Self::failed(format!("{action} failed: {}", output.summary()))
        }
    }

    /// Folds several partial outcomes into one. Any failure fails the whole.
    pub fn combine(outcomes: Vec<StepOutcome>) -> Self {
        if outcomes.is_empty() {
            return Self::skipped("nothing to do");
        }
        let status = if outcomes.iter().any(|o| o.status.is_failure()) {
            StepStatus::Failed
        } else if outcomes.iter().all(|o| o.status == StepStatus::Skipped) {
            StepStatus::Skipped
        } else {
            StepStatus::Succeeded
        };
        let detail = outcomes
            .into_iter()
            .map(|o| o.detail)
            .collect::<Vec<_>>()
            .join("; ");
        Self { status, detail }
    }
}

/// One action of the remediation pipeline.
#[async_trait]
pub trait RemediationStep: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self) -> StepOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryResult {
    /// The pipeline ran.
    Executed {
        attempt: RecoveryAttempt,
        steps: Vec<StepReport>,
    },
    /// The previous attempt started less than the cooldown ago.
    CoolingDown { remaining: Duration },
    /// Another recovery is still running.
    AlreadyRunning,
}

impl RecoveryResult {
    pub fn executed(&self) -> bool {
        matches!(self, RecoveryResult::Executed { .. })
    }
}

pub struct RecoveryOrchestrator {
    steps: Vec<Box<dyn RemediationStep>>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    in_flight: AtomicBool,
    last_started: Mutex<Option<Instant>>,
    history: Mutex<VecDeque<RecoveryAttempt>>,
}

/// Clears the in-flight flag when the recovery ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RecoveryOrchestrator {
    pub fn new(steps: Vec<Box<dyn RemediationStep>>, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            steps,
            clock,
            cooldown,
            in_flight: AtomicBool::new(false),
            last_started: Mutex::new(None),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LEN)),
        }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub async fn recover(&self, reason: TriggerReason) -> RecoveryResult {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Recovery requested ({reason}) while another one is running, dropping it");
            return RecoveryResult::AlreadyRunning;
        }
        let _guard = InFlight(&self.in_flight);

        let started: Instant = self.clock.now();
        {
            let mut last = self.last_started.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(previous) = *last {
                let elapsed = started.saturating_duration_since(previous);
                if elapsed < self.cooldown {
                    let remaining = self.cooldown - elapsed;
                    info!(
                        "Recovery requested ({reason}) but cooling down for another {}s",
                        remaining.as_secs()
                    );
                    return RecoveryResult::CoolingDown { remaining };
                }
            }
            *last = Some(started);
        }

        let triggered_at = self.clock.utc();
        info!("Starting recovery ({reason}), {} steps", self.steps.len());

        let mut reports: Vec<StepReport> = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            info!("Step {}/{}: {}", index + 1, self.steps.len(), step.name());
            let outcome = step.run().await;
            match outcome.status {
                StepStatus::Succeeded => success!("{}: {}", step.name(), outcome.detail),
                StepStatus::Skipped => info!("{} skipped: {}", step.name(), outcome.detail),
                StepStatus::Failed => error!("{}: {}", step.name(), outcome.detail),
            }
            reports.push(StepReport {
                step: step.name().to_string(),
                status: outcome.status,
                detail: outcome.detail,
            });
        }

        let succeeded = !reports.iter().any(|report| report.status.is_failure());
        let attempt = RecoveryAttempt {
            triggered_at,
            trigger_reason: reason,
            succeeded,
        };

        if succeeded {
            success!("Recovery finished");
        } else {
            warn!("Recovery finished with failed steps");
        }
        self.remember(attempt.clone());

        RecoveryResult::Executed { attempt, steps: reports }
    }

    /// Most recent attempts, oldest first.
    pub fn history(&self) -> Vec<RecoveryAttempt> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn last_attempt(&self) -> Option<RecoveryAttempt> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .back()
            .cloned()
    }

    fn remember(&self, attempt: RecoveryAttempt) {
        let mut history = self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if history.len() == HISTORY_LEN {
            history.pop_front();
        }
        history.push_back(attempt);
    }
}

/// Replaces `path` with `content` through a temporary file in the same directory.
///
/// The replacement keeps the permissions of the file it replaces.
pub(crate) async fn replace_file(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".nanowatch.tmp");
    let temp_path = path.with_file_name(temp_name);

    tokio::fs::write(&temp_path, content).await?;
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        if let Err(e) = tokio::fs::set_permissions(&temp_path, metadata.permissions()).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    }
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
