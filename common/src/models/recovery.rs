use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerReason {
    NetworkChange,
    ServiceUnhealthy,
    /// Requested from the command line.
    Manual,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TriggerReason::NetworkChange => "network change",
            TriggerReason::ServiceUnhealthy => "service unhealthy",
            TriggerReason::Manual => "manual request",
        };
        f.write_str(label)
    }
}

/// One executed run of the remediation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    pub triggered_at: DateTime<Utc>,
    pub trigger_reason: TriggerReason,
    pub succeeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl StepStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, StepStatus::Failed)
    }
}

/// Outcome of a single remediation step, as logged and aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub status: StepStatus,
    pub detail: String,
}
