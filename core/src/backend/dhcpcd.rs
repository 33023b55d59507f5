use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use nanowatch_common::models::ConfigurationMode;

use super::{BackendKind, NetworkBackend, restart_unit};
use crate::recovery::StepOutcome;
use crate::runner::CommandRunner;

pub struct Dhcpcd {
    runner: Arc<dyn CommandRunner>,
    conf: PathBuf,
    limit: Duration,
}

impl Dhcpcd {
    pub fn new(runner: Arc<dyn CommandRunner>, conf: PathBuf, limit: Duration) -> Self {
        Self { runner, conf, limit }
    }
}

#[async_trait]
impl NetworkBackend for Dhcpcd {
    fn kind(&self) -> BackendKind {
        BackendKind::Dhcpcd
    }

    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode {
        match tokio::fs::read_to_string(&self.conf).await {
            Ok(content) => parse_conf(&content, interface),
            Err(e) => {
                // dhcpcd without a config file leases every interface
                debug!("Cannot read {}: {e}", self.conf.display());
                ConfigurationMode::Dhcp
            }
        }
    }

    async fn restart(&self) -> StepOutcome {
        restart_unit(self.runner.as_ref(), "dhcpcd", self.limit).await
    }
}

enum Block<'a> {
    Global,
    Interface(&'a str),
    Profile,
}

/// dhcpcd leases every interface unless an `interface` block assigns a static address
/// or the interface is excluded.
///
/// `static` options inside a `profile` only apply as a DHCP `fallback`, so they do not
/// make the interface static.
pub fn parse_conf(content: &str, interface: &str) -> ConfigurationMode {
    let mut block = Block::Global;
    let mut mode = ConfigurationMode::Dhcp;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            continue;
        };

        match keyword {
            "interface" => block = Block::Interface(words.next().unwrap_or_default()),
            "profile" => block = Block::Profile,
            "denyinterfaces" if line.split_whitespace().skip(1).any(|name| name == interface) => {
                return ConfigurationMode::Unknown;
            }
            "static" => {
                let is_address = words.next().is_some_and(|option| option.starts_with("ip_address="));
                let applies = match block {
                    Block::Interface(name) => name == interface,
                    Block::Global => true,
                    Block::Profile => false,
                };
                if is_address && applies {
                    mode = ConfigurationMode::Static;
                }
            }
            _ => {}
        }
    }

    mode
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
