use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use nanowatch_common::config::DnsConfig;

use super::{RemediationStep, StepOutcome, replace_file};
use crate::dns::{Resolver, first_working};
use crate::network::inspect::parse_resolv_conf;

const BACKUP_SUFFIX: &str = ".nanowatch.bak";

/// Rewrites resolv.conf with known-good servers when none of the current ones resolve.
pub struct RepairDns {
    resolver: Arc<dyn Resolver>,
    resolv_conf: PathBuf,
    check_domain: String,
    fallback_servers: Vec<IpAddr>,
    limit: Duration,
}

impl RepairDns {
    pub fn new(resolver: Arc<dyn Resolver>, config: &DnsConfig) -> Self {
        Self {
            resolver,
            resolv_conf: config.resolv_conf.clone(),
            check_domain: config.check_domain.clone(),
            fallback_servers: config.fallback_servers.clone(),
            limit: Duration::from_secs(config.query_timeout_secs),
        }
    }

    async fn rewrite(&self, current: &str) -> std::io::Result<()> {
        let backup = backup_path(&self.resolv_conf);
        if !current.is_empty() {
            tokio::fs::write(&backup, current).await?;
            info!("Saved previous resolver configuration to {}", backup.display());
        }
        replace_file(&self.resolv_conf, &render_resolv_conf(current, &self.fallback_servers)).await
    }
}

#[async_trait]
impl RemediationStep for RepairDns {
    fn name(&self) -> &'static str {
        "repair dns"
    }

    async fn run(&self) -> StepOutcome {
        let current = match tokio::fs::read_to_string(&self.resolv_conf).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return StepOutcome::failed(format!("cannot read {}: {e}", self.resolv_conf.display())),
        };

        let servers = parse_resolv_conf(&current);
        if let Some(server) = first_working(self.resolver.as_ref(), &servers, &self.check_domain, self.limit).await {
            return StepOutcome::skipped(format!("{server} resolves {}", self.check_domain));
        }

        if self.fallback_servers.is_empty() {
            return StepOutcome::failed("resolution fails and no fallback servers are configured");
        }
        if servers == self.fallback_servers {
            warn!("Fallback DNS servers are already in place but do not answer");
        }

        if let Err(e) = self.rewrite(&current).await {
            return StepOutcome::failed(format!("cannot rewrite {}: {e}", self.resolv_conf.display()));
        }

        let written = join(&self.fallback_servers);
        match first_working(self.resolver.as_ref(), &self.fallback_servers, &self.check_domain, self.limit).await {
            Some(server) => StepOutcome::succeeded(format!("switched to {written}, {server} resolves {}", self.check_domain)),
            None => StepOutcome::failed(format!("switched to {written} but {} still does not resolve", self.check_domain)),
        }
    }
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Replaces every `nameserver` line of `current` with `servers`, keeping `search`,
/// `domain` and `options` lines.
pub fn render_resolv_conf(current: &str, servers: &[IpAddr]) -> String {
    let mut content = String::from("# Generated by nanowatch\n");
    for server in servers {
        content.push_str(&format!("nameserver {server}\n"));
    }
    for line in current.lines() {
        let keyword = line.split_whitespace().next().unwrap_or_default();
        if matches!(keyword, "search" | "domain" | "options") {
            content.push_str(line.trim());
            content.push('\n');
        }
    }
    content
}

fn join(servers: &[IpAddr]) -> String {
    servers.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
