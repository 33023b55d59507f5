use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthState {
    Healthy,
    Degraded,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Healthy => f.write_str("HEALTHY"),
            HealthState::Degraded => f.write_str("DEGRADED"),
        }
    }
}

/// Rolling health record of one managed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_id: String,
    pub last_check_at: Option<DateTime<Utc>>,
    pub is_running: bool,
    pub is_responding: bool,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl ServiceHealth {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            last_check_at: None,
            is_running: false,
            is_responding: false,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_check_at = Some(at);
        self.is_running = true;
        self.is_responding = true;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>, is_running: bool, error: impl Into<String>) {
        self.last_check_at = Some(at);
        self.is_running = is_running;
        self.is_responding = false;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error.into());
    }

    /// A service leaves `Degraded` only through a successful probe.
    pub fn state(&self) -> HealthState {
        if self.consecutive_failures == 0 {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        }
    }

    pub fn needs_recovery(&self, threshold: u32) -> bool {
        self.consecutive_failures >= threshold.max(1)
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
