//! Service health polling.
//!
//! Each managed service is checked in two stages: first whether its container, unit or
//! process is alive, then whether it answers HTTP on its health path and extra endpoints. Any failure bumps the
//! service's consecutive failure count; a successful probe is the only thing that resets it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, warn};

use nanowatch_common::clock::Clock;
use nanowatch_common::config::ServiceConfig;
use nanowatch_common::models::ServiceHealth;

use crate::runtime::ServiceRuntime;

#[async_trait]
pub trait HttpProbe: Send + Sync {
    /// GETs `url` and returns the HTTP status code.
    async fn get(&self, url: &str) -> anyhow::Result<u16>;
}

pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("nanowatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str) -> anyhow::Result<u16> {
        let response = self.client.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}

pub struct HealthChecker {
    runtime: Arc<dyn ServiceRuntime>,
    probe: Arc<dyn HttpProbe>,
    clock: Arc<dyn Clock>,
    probe_host: String,
    threshold: u32,
    health: BTreeMap<String, ServiceHealth>,
}

impl HealthChecker {
    pub fn new(
        runtime: Arc<dyn ServiceRuntime>,
        probe: Arc<dyn HttpProbe>,
        clock: Arc<dyn Clock>,
        probe_host: impl Into<String>,
        threshold: u32,
    ) -> Self {
        Self {
            runtime,
            probe,
            clock,
            probe_host: probe_host.into(),
            threshold: threshold.max(1),
            health: BTreeMap::new(),
        }
    }

    /// Checks every service once, sequentially, and returns the updated health map.
    ///
    /// Services no longer in `services` are forgotten.
    pub async fn check_all(&mut self, services: &[ServiceConfig]) -> &BTreeMap<String, ServiceHealth> {
        self.health
            .retain(|id, _| services.iter().any(|service| &service.id == id));

        for service in services {
            let result = self.check(service).await;
            let now = self.clock.utc();
            let entry = self
                .health
                .entry(service.id.clone())
                .or_insert_with(|| ServiceHealth::new(service.id.clone()));

            match result {
                Ok(()) => {
                    if entry.consecutive_failures > 0 {
                        debug!("{} responds again", service.id);
                    }
                    entry.record_success(now);
                }
                Err(Failure { running, reason }) => {
                    entry.record_failure(now, running, reason);
                    warn!(
                        "{} unhealthy ({} consecutive): {}",
                        service.id,
                        entry.consecutive_failures,
                        entry.last_error.as_deref().unwrap_or_default()
                    );
                }
            }
        }

        &self.health
    }

    async fn check(&self, service: &ServiceConfig) -> Result<(), Failure> {
        if !self.runtime.is_running(service).await {
            return Err(Failure {
                running: false,
                reason: format!("{} is not running", self.runtime.name()),
            });
        }

        // The health path first, then the extra endpoints; the first failure wins.
        for url in service.probe_urls(&self.probe_host) {
            match self.probe.get(&url).await {
                Ok(status) if status < 400 => {}
                Ok(status) => {
                    return Err(Failure {
                        running: true,
                        reason: format!("GET {url} returned {status}"),
                    });
                }
                Err(e) => {
                    return Err(Failure {
                        running: true,
                        reason: format!("GET {url} failed: {e}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Ids of services at or above the failure threshold.
    pub fn needing_recovery(&self) -> Vec<&str> {
        self.health
            .values()
            .filter(|health| health.needs_recovery(self.threshold))
            .map(|health| health.service_id.as_str())
            .collect()
    }

    pub fn health(&self) -> &BTreeMap<String, ServiceHealth> {
        &self.health
    }
}

struct Failure {
    running: bool,
    reason: String,
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
