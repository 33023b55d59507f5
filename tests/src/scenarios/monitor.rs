use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use nanowatch_common::clock::ManualClock;
use nanowatch_common::config::{HostEnvConfig, ServiceConfig};
use nanowatch_common::models::{ConfigurationMode, TriggerReason};
use nanowatch_core::health::HealthChecker;
use nanowatch_core::monitor::Monitor;
use nanowatch_core::recovery::host_env::RewriteHostEnv;
use nanowatch_core::recovery::network::RestartNetwork;
use nanowatch_core::recovery::services::RestartServices;
use nanowatch_core::recovery::{RecoveryOrchestrator, RecoveryResult, RemediationStep};

use super::snapshotter;
use crate::fakes::{FakeBackend, FakeInspector, FakeProbe, FakeRuntime};
use crate::util::{eth0, lo};

const COOLDOWN: Duration = Duration::from_secs(60);

struct Deployment {
    monitor: Monitor,
    orchestrator: Arc<RecoveryOrchestrator>,
    inspector: Arc<FakeInspector>,
    backend: Arc<FakeBackend>,
    runtime: Arc<FakeRuntime>,
    probe: Arc<FakeProbe>,
    clock: Arc<ManualClock>,
}

/// The production pipeline minus DNS and clock repair, on a Nano Pi at 192.168.1.10.
fn deployment(env_file: &Path) -> Deployment {
    let inspector = FakeInspector::new(vec![lo(), eth0(10)]);
    inspector.set_route("eth0", Some("192.168.1.1".parse().unwrap()));
    inspector.set_reachable(true);
    let (snapshotter, inspector, backend, clock) = snapshotter(inspector, ConfigurationMode::Dhcp);

    let runtime = Arc::new(FakeRuntime::new(true));
    let probe = Arc::new(FakeProbe::responding(200));
    let services = vec![ServiceConfig::new("bellapp", 5000), ServiceConfig::new("newsapp", 8000)];

    let host_env = HostEnvConfig {
        env_file: env_file.to_path_buf(),
        ..HostEnvConfig::default()
    };
    let mut steps: Vec<Box<dyn RemediationStep>> = Vec::new();
    steps.push(Box::new(RestartNetwork::new(backend.clone(), Duration::ZERO)));
    steps.push(Box::new(RestartServices::new(runtime.clone(), services.clone())));
    steps.push(Box::new(RewriteHostEnv::new(snapshotter.clone(), &host_env)));
    let orchestrator = Arc::new(RecoveryOrchestrator::new(steps, clock.clone(), COOLDOWN));

    let checker = HealthChecker::new(runtime.clone(), probe.clone(), clock.clone(), "127.0.0.1", 1);
    let monitor = Monitor::new(
        snapshotter,
        checker,
        orchestrator.clone(),
        clock.clone(),
        services,
        Duration::from_secs(30),
    );

    Deployment {
        monitor,
        orchestrator,
        inspector,
        backend,
        runtime,
        probe,
        clock,
    }
}

#[tokio::test]
async fn three_failed_probes_give_one_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));
    d.probe.set_status(None);

    for _ in 0..3 {
        let outcome = d.monitor.cycle().await.unwrap();
        assert_eq!(outcome.unhealthy, vec!["bellapp", "newsapp"]);
        d.clock.advance(Duration::from_secs(15));
    }

    let history = d.orchestrator.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].trigger_reason, TriggerReason::ServiceUnhealthy);
    assert_eq!(d.backend.restarts(), 1);
    assert_eq!(d.runtime.restarts(), 1);
}

#[tokio::test]
async fn unhealthy_services_recover_again_after_the_cooldown() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));
    d.runtime.set_running(false);

    d.monitor.cycle().await.unwrap();
    d.clock.advance(COOLDOWN);
    let outcome = d.monitor.cycle().await.unwrap();

    assert!(matches!(outcome.recovery, Some(RecoveryResult::Executed { .. })));
    assert_eq!(d.orchestrator.history().len(), 2);
}

#[tokio::test]
async fn healthy_again_after_a_successful_probe() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));
    d.probe.set_status(Some(502));

    let outcome = d.monitor.cycle().await.unwrap();
    assert_eq!(outcome.unhealthy.len(), 2);

    d.probe.set_status(Some(200));
    d.clock.advance(Duration::from_secs(30));
    let outcome = d.monitor.cycle().await.unwrap();

    assert!(outcome.unhealthy.is_empty());
    assert!(outcome.recovery.is_none());
    let report = d.monitor.report(&outcome.snapshot);
    assert!(report.services.iter().all(|health| health.consecutive_failures == 0));
}

#[tokio::test]
async fn dhcp_renewal_rewrites_the_env_file() {
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join(".env");
    tokio::fs::write(&env_file, "APP_NAME=BellNews\nHOST_IP=192.168.1.10\nAPP_URL=http://192.168.1.10:8000\n")
        .await
        .unwrap();
    let mut d = deployment(&env_file);

    let baseline = d.monitor.cycle().await.unwrap();
    assert!(baseline.recovery.is_none());

    d.inspector.set_interfaces(vec![lo(), eth0(50)]);
    d.clock.advance(Duration::from_secs(30));
    let outcome = d.monitor.cycle().await.unwrap();

    assert!(outcome.network_changed);
    let Some(RecoveryResult::Executed { attempt, steps }) = outcome.recovery else {
        panic!("expected an executed recovery");
    };
    assert_eq!(attempt.trigger_reason, TriggerReason::NetworkChange);
    assert!(attempt.succeeded);
    assert_eq!(steps.len(), 3);

    let content = tokio::fs::read_to_string(&env_file).await.unwrap();
    assert_eq!(
        content,
        "APP_NAME=BellNews\nHOST_IP=192.168.1.50\nAPP_URL=http://192.168.1.50:8000\n"
    );
}

#[tokio::test]
async fn address_change_during_cooldown_is_applied_later() {
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join(".env");
    tokio::fs::write(&env_file, "HOST_IP=192.168.1.10\nAPP_URL=http://192.168.1.10:8000\n")
        .await
        .unwrap();
    let mut d = deployment(&env_file);

    d.runtime.set_running(false);
    let first = d.monitor.cycle().await.unwrap();
    assert!(matches!(first.recovery, Some(RecoveryResult::Executed { .. })));
    d.runtime.set_running(true);

    d.inspector.set_interfaces(vec![lo(), eth0(50)]);
    d.clock.advance(Duration::from_secs(10));
    let outcome = d.monitor.cycle().await.unwrap();
    assert!(outcome.network_changed);
    assert!(matches!(outcome.recovery, Some(RecoveryResult::CoolingDown { .. })));

    for _ in 0..5 {
        d.clock.advance(Duration::from_secs(30));
        d.monitor.cycle().await.unwrap();
    }

    let history = d.orchestrator.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].trigger_reason, TriggerReason::NetworkChange);
    let content = tokio::fs::read_to_string(&env_file).await.unwrap();
    assert_eq!(content, "HOST_IP=192.168.1.50\nAPP_URL=http://192.168.1.50:8000\n");
}

#[tokio::test]
async fn mode_toggle_counts_as_a_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));

    d.monitor.cycle().await.unwrap();
    d.backend.set_mode(ConfigurationMode::Static);
    d.clock.advance(Duration::from_secs(30));

    assert!(d.monitor.cycle().await.unwrap().network_changed);
}

#[tokio::test]
async fn failed_mode_query_does_not_trigger_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));

    d.monitor.cycle().await.unwrap();
    d.backend.set_mode(ConfigurationMode::Unknown);
    d.clock.advance(Duration::from_secs(30));
    assert!(!d.monitor.cycle().await.unwrap().network_changed);

    d.backend.set_mode(ConfigurationMode::Dhcp);
    d.clock.advance(Duration::from_secs(60));
    assert!(!d.monitor.cycle().await.unwrap().network_changed);

    assert_eq!(d.backend.restarts(), 0);
    assert!(d.orchestrator.history().is_empty());
}

#[tokio::test]
async fn mode_toggle_behind_a_failed_query_is_still_seen() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));

    d.monitor.cycle().await.unwrap();
    d.backend.set_mode(ConfigurationMode::Unknown);
    d.clock.advance(Duration::from_secs(30));
    d.monitor.cycle().await.unwrap();

    d.backend.set_mode(ConfigurationMode::Static);
    d.clock.advance(Duration::from_secs(30));
    assert!(d.monitor.cycle().await.unwrap().network_changed);
}

#[tokio::test]
async fn reachability_flap_is_not_a_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut d = deployment(&dir.path().join(".env"));

    d.monitor.cycle().await.unwrap();
    d.inspector.set_reachable(false);
    d.inspector.set_dns(vec!["1.1.1.1".parse().unwrap()]);
    d.clock.advance(Duration::from_secs(30));
    let outcome = d.monitor.cycle().await.unwrap();

    assert!(!outcome.network_changed);
    assert!(outcome.recovery.is_none());
    assert!(d.orchestrator.history().is_empty());
}
