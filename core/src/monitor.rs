//! The polling loop.
//!
//! Every cycle captures a snapshot, compares it with the previous one, polls service health
//! and asks for at most one recovery. The loop owns the last snapshot and the health map;
//! nothing else reads or writes them. A failing cycle is logged and the loop carries on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use nanowatch_common::clock::Clock;
use nanowatch_common::config::ServiceConfig;
use nanowatch_common::models::{HealthState, NetworkSnapshot, RecoveryAttempt, ServiceHealth, TriggerReason};

use crate::compare;
use crate::health::HealthChecker;
use crate::recovery::{RecoveryOrchestrator, RecoveryResult, replace_file};
use crate::snapshot::NetworkSnapshotter;

/// Written to the state directory after every cycle for `nanowatch status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub backend: String,
    pub runtime: String,
    pub snapshot: NetworkSnapshot,
    pub services: Vec<ServiceHealth>,
    pub last_recovery: Option<RecoveryAttempt>,
    pub recent_recoveries: Vec<RecoveryAttempt>,
    /// Recent log lines per service id. Filled by `nanowatch status`, never by the loop.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub logs: BTreeMap<String, Vec<String>>,
}

impl StatusReport {
    /// What keeps this report from being healthy: an unreachable internet or degraded services.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.snapshot.internet_reachable {
            problems.push("internet unreachable".to_string());
        }
        for health in &self.services {
            if health.state() == HealthState::Degraded {
                problems.push(format!("{} degraded", health.service_id));
            }
        }
        problems
    }

    pub async fn read(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// What a single cycle did.
#[derive(Debug)]
pub struct CycleOutcome {
    pub snapshot: NetworkSnapshot,
    pub network_changed: bool,
    pub unhealthy: Vec<String>,
    pub recovery: Option<RecoveryResult>,
}

pub struct Monitor {
    snapshotter: Arc<NetworkSnapshotter>,
    checker: HealthChecker,
    orchestrator: Arc<RecoveryOrchestrator>,
    clock: Arc<dyn Clock>,
    services: Vec<ServiceConfig>,
    interval: Duration,
    status_file: Option<PathBuf>,
    runtime_name: String,
    last_snapshot: Option<NetworkSnapshot>,
    /// A network change no recovery has answered yet.
    pending_change: bool,
}

impl Monitor {
    pub fn new(
        snapshotter: Arc<NetworkSnapshotter>,
        checker: HealthChecker,
        orchestrator: Arc<RecoveryOrchestrator>,
        clock: Arc<dyn Clock>,
        services: Vec<ServiceConfig>,
        interval: Duration,
    ) -> Self {
        Self {
            snapshotter,
            checker,
            orchestrator,
            clock,
            services,
            interval,
            status_file: None,
            runtime_name: String::new(),
            last_snapshot: None,
            pending_change: false,
        }
    }

    /// Writes a [`StatusReport`] to `path` after every cycle.
    pub fn with_status_file(mut self, path: PathBuf, runtime_name: impl Into<String>) -> Self {
        self.status_file = Some(path);
        self.runtime_name = runtime_name.into();
        self
    }

    pub fn last_snapshot(&self) -> Option<&NetworkSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// A network change is still waiting for a recovery, e.g. one that arrived during a cooldown.
    pub fn change_pending(&self) -> bool {
        self.pending_change
    }

    /// Runs cycles until `shutdown` turns true or its sender goes away.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Monitoring every {}s", self.interval.as_secs());

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.cycle().await {
                error!("Monitoring cycle failed: {e:#}");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Monitor stopped");
    }

    pub async fn cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        let snapshot = self.snapshotter.capture().await;
        debug!(
            "{} {} via {} ({}), reachable: {}",
            snapshot.interface_name,
            snapshot.cidr().unwrap_or_else(|| "no address".to_string()),
            snapshot.gateway_address.map_or_else(|| "no gateway".to_string(), |gw| gw.to_string()),
            snapshot.configuration_mode,
            snapshot.internet_reachable
        );
        if !snapshot.internet_reachable {
            warn!("Internet is not reachable");
        }

        let network_changed = match &self.last_snapshot {
            Some(previous) if compare::has_changed(previous, &snapshot) => {
                info!("Network changed: {}", compare::changes(previous, &snapshot).join(", "));
                true
            }
            _ => false,
        };
        let mut baseline = snapshot.clone();
        if !baseline.configuration_mode.is_known() {
            if let Some(previous) = &self.last_snapshot {
                baseline.configuration_mode = previous.configuration_mode;
            }
        }
        self.last_snapshot = Some(baseline);
        if network_changed {
            self.pending_change = true;
        }

        self.checker.check_all(&self.services).await;
        let unhealthy: Vec<String> = self
            .checker
            .needing_recovery()
            .into_iter()
            .map(str::to_string)
            .collect();

        let trigger = if self.pending_change {
            if !network_changed {
                debug!("Retrying recovery for an earlier network change");
            }
            Some(TriggerReason::NetworkChange)
        } else if !unhealthy.is_empty() {
            info!("Services needing recovery: {}", unhealthy.join(", "));
            Some(TriggerReason::ServiceUnhealthy)
        } else {
            None
        };

        let recovery = match trigger {
            Some(reason) => Some(self.orchestrator.recover(reason).await),
            None => None,
        };
        if recovery.as_ref().is_some_and(RecoveryResult::executed) {
            self.pending_change = false;
        }

        if let Some(path) = &self.status_file {
            if let Err(e) = self.write_status(path, &snapshot).await {
                warn!("Could not write status report: {e:#}");
            }
        }

        Ok(CycleOutcome {
            snapshot,
            network_changed,
            unhealthy,
            recovery,
        })
    }

    pub fn report(&self, snapshot: &NetworkSnapshot) -> StatusReport {
        StatusReport {
            generated_at: self.clock.utc(),
            backend: self.snapshotter.backend().kind().to_string(),
            runtime: self.runtime_name.clone(),
            snapshot: snapshot.clone(),
            services: self.checker.health().values().cloned().collect(),
            last_recovery: self.orchestrator.last_attempt(),
            recent_recoveries: self.orchestrator.history(),
            logs: BTreeMap::new(),
        }
    }

    async fn write_status(&self, path: &Path, snapshot: &NetworkSnapshot) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.report(snapshot))?;
        replace_file(path, &json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
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
