//! Wires the monitor's components together from a [`Config`].

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use nanowatch_common::clock::{Clock, SystemClock};
use nanowatch_common::config::Config;
use nanowatch_common::error::StartupError;

use crate::backend::{self, NetworkBackend};
use crate::dns::UdpResolver;
use crate::health::{HealthChecker, HttpProbe, ReqwestProbe};
use crate::monitor::Monitor;
use crate::network::{NetworkInspector, SystemInspector};
use crate::recovery::clock::ResyncClock;
use crate::recovery::dns::RepairDns;
use crate::recovery::host_env::RewriteHostEnv;
use crate::recovery::network::RestartNetwork;
use crate::recovery::services::RestartServices;
use crate::recovery::{RecoveryOrchestrator, RemediationStep};
use crate::runner::{CommandRunner, SystemRunner};
use crate::runtime::{self, ServiceRuntime};
use crate::snapshot::NetworkSnapshotter;

pub struct Components {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub backend: Arc<dyn NetworkBackend>,
    pub runtime: Arc<dyn ServiceRuntime>,
    pub probe: Arc<dyn HttpProbe>,
    pub snapshotter: Arc<NetworkSnapshotter>,
    pub orchestrator: Arc<RecoveryOrchestrator>,
}

impl Components {
    /// Builds everything against the real host.
    ///
    /// Fails when the host has no network interface besides loopback, or when no supported
    /// network backend can be found.
    pub async fn assemble(config: Config) -> Result<Self, StartupError> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let inspector: Arc<dyn NetworkInspector> = Arc::new(SystemInspector::new(Arc::clone(&runner), &config));

        let interfaces = inspector.interfaces();
        if !interfaces.iter().any(|interface| !interface.is_loopback()) {
            return Err(StartupError::NoInterface);
        }
        debug!(
            "Interfaces: {}",
            interfaces.iter().map(|i| i.name.as_str()).collect::<Vec<_>>().join(", ")
        );

        let backend = backend::detect(Arc::clone(&runner), &config).await?;
        let runtime = runtime::from_config(Arc::clone(&runner), &config);
        let probe: Arc<dyn HttpProbe> = Arc::new(
            ReqwestProbe::new(Duration::from_secs(config.health.http_timeout_secs))
                .map_err(|e| StartupError::HttpClient(format!("{e:#}")))?,
        );

        let snapshotter = Arc::new(NetworkSnapshotter::new(
            inspector,
            Arc::clone(&backend),
            Arc::clone(&clock),
            config.network.fallback_interface.clone(),
        ));
        let steps = remediation_steps(&config, runner, &backend, &runtime, &snapshotter);
        let orchestrator = Arc::new(RecoveryOrchestrator::new(steps, Arc::clone(&clock), config.cooldown()));

        Ok(Self {
            config,
            clock,
            backend,
            runtime,
            probe,
            snapshotter,
            orchestrator,
        })
    }

    pub fn health_checker(&self) -> HealthChecker {
        HealthChecker::new(
            Arc::clone(&self.runtime),
            Arc::clone(&self.probe),
            Arc::clone(&self.clock),
            self.config.health.probe_host.clone(),
            self.config.health.failure_threshold,
        )
    }

    pub fn monitor(&self) -> Monitor {
        Monitor::new(
            Arc::clone(&self.snapshotter),
            self.health_checker(),
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.clock),
            self.config.services.clone(),
            self.config.interval(),
        )
        .with_status_file(self.config.status_file(), self.runtime.name())
    }
}

/// The remediation pipeline, in order.
pub fn remediation_steps(
    config: &Config,
    runner: Arc<dyn CommandRunner>,
    backend: &Arc<dyn NetworkBackend>,
    runtime: &Arc<dyn ServiceRuntime>,
    snapshotter: &Arc<NetworkSnapshotter>,
) -> Vec<Box<dyn RemediationStep>> {
    let settle = Duration::from_secs(config.recovery.network_settle_secs);
    let mut steps: Vec<Box<dyn RemediationStep>> = Vec::with_capacity(5);
    steps.push(Box::new(RestartNetwork::new(Arc::clone(backend), settle)));
    steps.push(Box::new(RepairDns::new(Arc::new(UdpResolver::default()), &config.dns)));
    steps.push(Box::new(ResyncClock::new(
        runner,
        config.recovery.ntp_server.clone(),
        config.command_timeout(),
    )));
    steps.push(Box::new(RestartServices::new(Arc::clone(runtime), config.services.clone())));
    steps.push(Box::new(RewriteHostEnv::new(Arc::clone(snapshotter), &config.host_env)));
    steps
}
