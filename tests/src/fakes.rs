use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::NetworkInterface;

use nanowatch_common::config::ServiceConfig;
use nanowatch_common::error::CommandError;
use nanowatch_common::models::ConfigurationMode;
use nanowatch_core::backend::{BackendKind, NetworkBackend};
use nanowatch_core::health::HttpProbe;
use nanowatch_core::network::{DefaultRoute, NetworkInspector};
use nanowatch_core::recovery::{RemediationStep, StepOutcome};
use nanowatch_core::runner::{CommandOutput, CommandRunner};
use nanowatch_core::runtime::ServiceRuntime;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A host whose network facts are set by the test.
#[derive(Default)]
pub struct FakeInspector {
    interfaces: Mutex<Vec<NetworkInterface>>,
    route: Mutex<Option<DefaultRoute>>,
    dns: Mutex<Vec<IpAddr>>,
    reachable: AtomicBool,
}

impl FakeInspector {
    pub fn new(interfaces: Vec<NetworkInterface>) -> Self {
        let inspector = Self::default();
        inspector.set_interfaces(interfaces);
        inspector
    }

    pub fn set_interfaces(&self, interfaces: Vec<NetworkInterface>) {
        *lock(&self.interfaces) = interfaces;
    }

    pub fn set_route(&self, interface: &str, gateway: Option<IpAddr>) {
        *lock(&self.route) = Some(DefaultRoute {
            interface: interface.to_string(),
            gateway,
        });
    }

    pub fn clear_route(&self) {
        *lock(&self.route) = None;
    }

    pub fn set_dns(&self, servers: Vec<IpAddr>) {
        *lock(&self.dns) = servers;
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl NetworkInspector for FakeInspector {
    fn interfaces(&self) -> Vec<NetworkInterface> {
        lock(&self.interfaces).clone()
    }

    async fn default_route(&self) -> Option<DefaultRoute> {
        lock(&self.route).clone()
    }

    async fn dns_servers(&self) -> Vec<IpAddr> {
        lock(&self.dns).clone()
    }

    async fn internet_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

/// A network stack that reports a settable mode and counts restarts.
pub struct FakeBackend {
    mode: Mutex<ConfigurationMode>,
    restart_fails: AtomicBool,
    pub restarts: AtomicUsize,
}

impl FakeBackend {
    pub fn new(mode: ConfigurationMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            restart_fails: AtomicBool::new(false),
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: ConfigurationMode) {
        *lock(&self.mode) = mode;
    }

    pub fn fail_restarts(&self) {
        self.restart_fails.store(true, Ordering::SeqCst);
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dhcpcd
    }

    async fn configuration_mode(&self, _interface: &str) -> ConfigurationMode {
        *lock(&self.mode)
    }

    async fn restart(&self) -> StepOutcome {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.restart_fails.load(Ordering::SeqCst) {
            StepOutcome::failed("restart dhcpcd failed: unit not found")
        } else {
            StepOutcome::succeeded("restarted dhcpcd")
        }
    }
}

/// A runtime whose services are all up or all down.
pub struct FakeRuntime {
    running: AtomicBool,
    pub restarts: AtomicUsize,
}

impl FakeRuntime {
    pub fn new(running: bool) -> Self {
        Self {
            running: AtomicBool::new(running),
            restarts: AtomicUsize::new(0),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceRuntime for FakeRuntime {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn is_running(&self, _service: &ServiceConfig) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn restart_all(&self, services: &[ServiceConfig]) -> StepOutcome {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        StepOutcome::succeeded(format!("restarted {} services", services.len()))
    }
}

/// Answers every GET with the same status, or with a connection error.
pub struct FakeProbe {
    status: Mutex<Option<u16>>,
    pub calls: AtomicUsize,
}

impl FakeProbe {
    pub fn responding(status: u16) -> Self {
        Self {
            status: Mutex::new(Some(status)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn refusing() -> Self {
        Self {
            status: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_status(&self, status: Option<u16>) {
        *lock(&self.status) = status;
    }
}

#[async_trait]
impl HttpProbe for FakeProbe {
    async fn get(&self, url: &str) -> anyhow::Result<u16> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match *lock(&self.status) {
            Some(status) => Ok(status),
            None => anyhow::bail!("connection refused ({url})"),
        }
    }
}

/// Scripted command runner that records every invocation.
#[derive(Default)]
pub struct FakeRunner {
    available: HashSet<String>,
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `program` exist; unscripted invocations succeed with no output.
    pub fn with_program(mut self, program: &str) -> Self {
        self.available.insert(program.to_string());
        self
    }

    /// Scripts the output for an exact command line, e.g. `"systemctl is-active dhcpcd"`.
    pub fn with_response(mut self, command_line: &str, output: CommandOutput) -> Self {
        if let Some(program) = command_line.split_whitespace().next() {
            self.available.insert(program.to_string());
        }
        self.responses.insert(command_line.to_string(), output);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[&str], _limit: Duration) -> Result<CommandOutput, CommandError> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        lock(&self.calls).push(command_line.clone());

        if !self.available.contains(program) {
            return Err(CommandError::NotFound(program.to_string()));
        }
        Ok(self
            .responses
            .get(&command_line)
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }

    fn exists(&self, program: &str) -> bool {
        self.available.contains(program)
    }
}

/// A remediation step that only counts its runs.
pub struct CountingStep {
    name: &'static str,
    pub runs: Arc<AtomicUsize>,
}

impl CountingStep {
    pub fn boxed(name: &'static str, runs: Arc<AtomicUsize>) -> Box<dyn RemediationStep> {
        Box::new(Self { name, runs })
    }
}

#[async_trait]
impl RemediationStep for CountingStep {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self) -> StepOutcome {
        self.runs.fetch_add(1, Ordering::SeqCst);
        StepOutcome::succeeded("counted")
    }
}
