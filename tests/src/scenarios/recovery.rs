use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nanowatch_common::clock::ManualClock;
use nanowatch_common::config::{BackendPreference, Config, HostEnvConfig, ServiceConfig};
use nanowatch_common::error::StartupError;
use nanowatch_common::models::{ConfigurationMode, StepStatus, TriggerReason};
use nanowatch_core::backend::{self, BackendKind};
use nanowatch_core::recovery::host_env::RewriteHostEnv;
use nanowatch_core::recovery::network::RestartNetwork;
use nanowatch_core::recovery::services::RestartServices;
use nanowatch_core::recovery::{RecoveryOrchestrator, RecoveryResult, RemediationStep};
use nanowatch_core::runner::CommandOutput;

use super::snapshotter;
use crate::fakes::{CountingStep, FakeInspector, FakeRunner, FakeRuntime};
use crate::util::{eth0, lo};

#[tokio::test]
async fn second_trigger_within_cooldown_runs_nothing() {
    let clock = Arc::new(ManualClock::new());
    let runs = Arc::new(AtomicUsize::new(0));
    let orchestrator = RecoveryOrchestrator::new(
        vec![CountingStep::boxed("count", runs.clone())],
        clock.clone(),
        Duration::from_secs(60),
    );

    assert!(orchestrator.recover(TriggerReason::NetworkChange).await.executed());
    clock.advance(Duration::from_secs(20));
    let second = orchestrator.recover(TriggerReason::Manual).await;

    assert_eq!(
        second,
        RecoveryResult::CoolingDown {
            remaining: Duration::from_secs(40)
        }
    );
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.history().len(), 1);
}

#[tokio::test]
async fn failed_network_restart_does_not_stop_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join(".env");

    let inspector = FakeInspector::new(vec![lo(), eth0(50)]);
    let (snapshotter, _inspector, backend, clock) = snapshotter(inspector, ConfigurationMode::Dhcp);
    backend.fail_restarts();
    let runtime = Arc::new(FakeRuntime::new(true));

    let host_env = HostEnvConfig {
        env_file: env_file.clone(),
        ..HostEnvConfig::default()
    };
    let mut steps: Vec<Box<dyn RemediationStep>> = Vec::new();
    steps.push(Box::new(RestartNetwork::new(backend.clone(), Duration::from_secs(10))));
    steps.push(Box::new(RestartServices::new(runtime.clone(), vec![ServiceConfig::new("bellapp", 5000)])));
    steps.push(Box::new(RewriteHostEnv::new(snapshotter, &host_env)));
    let orchestrator = RecoveryOrchestrator::new(steps, clock, Duration::from_secs(60));

    let RecoveryResult::Executed { attempt, steps } = orchestrator.recover(TriggerReason::Manual).await else {
        panic!("expected an executed recovery");
    };

    let statuses: Vec<StepStatus> = steps.iter().map(|step| step.status).collect();
    assert_eq!(statuses, vec![StepStatus::Failed, StepStatus::Succeeded, StepStatus::Succeeded]);
    assert!(!attempt.succeeded);
    assert_eq!(runtime.restarts(), 1);

    let content = tokio::fs::read_to_string(&env_file).await.unwrap();
    assert_eq!(content, "HOST_IP=192.168.1.50\nAPP_URL=http://192.168.1.50:8000\n");
}

#[tokio::test]
async fn unchanged_env_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join(".env");
    tokio::fs::write(&env_file, "HOST_IP=192.168.1.10\nAPP_URL=http://192.168.1.10:8000\n")
        .await
        .unwrap();

    let (snapshotter, ..) = snapshotter(FakeInspector::new(vec![lo(), eth0(10)]), ConfigurationMode::Dhcp);
    let step = RewriteHostEnv::new(
        snapshotter,
        &HostEnvConfig {
            env_file,
            ..HostEnvConfig::default()
        },
    );

    assert_eq!(step.run().await.status, StepStatus::Skipped);
}

fn dhcpcd_host(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.network.dhcpcd_conf = dir.join("dhcpcd.conf");
    config.network.netplan_dir = dir.join("netplan");
    config.network.interfaces_file = dir.join("interfaces");
    config
}

#[tokio::test]
async fn detects_dhcpcd_and_restarts_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = dhcpcd_host(dir.path());
    tokio::fs::write(&config.network.dhcpcd_conf, "interface eth0\nstatic ip_address=192.168.1.10/24\n")
        .await
        .unwrap();

    let runner = Arc::new(
        FakeRunner::new()
            .with_program("dhcpcd")
            .with_response("systemctl is-active --quiet dhcpcd", CommandOutput::failed("inactive")),
    );
    let backend = backend::detect(runner.clone(), &config).await.unwrap();

    assert_eq!(backend.kind(), BackendKind::Dhcpcd);
    assert_eq!(backend.configuration_mode("eth0").await, ConfigurationMode::Static);
    assert_eq!(backend.configuration_mode("wlan0").await, ConfigurationMode::Dhcp);

    let step = RestartNetwork::new(backend, Duration::ZERO);
    assert_eq!(step.run().await.status, StepStatus::Succeeded);
    assert!(runner.calls().contains(&"systemctl restart dhcpcd".to_string()));
}

#[tokio::test]
async fn host_without_a_backend_cannot_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = dhcpcd_host(dir.path());
    let runner = Arc::new(FakeRunner::new().with_program("systemctl"));

    let result = backend::detect(runner, &config).await;

    assert!(matches!(result, Err(StartupError::NoBackend(_))));
}

#[tokio::test]
async fn preferred_backend_must_be_present() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = dhcpcd_host(dir.path());
    config.network.backend = BackendPreference::Netplan;
    let runner = Arc::new(FakeRunner::new().with_program("netplan"));

    let result = backend::detect(runner, &config).await;

    assert!(matches!(result, Err(StartupError::BackendUnavailable(name)) if name == "netplan"));
}
