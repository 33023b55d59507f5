use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use nanowatch_common::models::ConfigurationMode;

use super::{BackendKind, NetworkBackend};
use crate::recovery::StepOutcome;
use crate::runner::{CommandRunner, run_lenient};

pub struct Netplan {
    runner: Arc<dyn CommandRunner>,
    dir: PathBuf,
    limit: Duration,
}

impl Netplan {
    pub fn new(runner: Arc<dyn CommandRunner>, dir: PathBuf, limit: Duration) -> Self {
        Self { runner, dir, limit }
    }
}

#[async_trait]
impl NetworkBackend for Netplan {
    fn kind(&self) -> BackendKind {
        BackendKind::Netplan
    }

    async fn configuration_mode(&self, interface: &str) -> ConfigurationMode {
        let mut documents: Vec<String> = Vec::new();
        for path in config_files(&self.dir).await {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => documents.push(content),
                Err(e) => debug!("Cannot read {}: {e}", path.display()),
            }
        }
        mode_for(&documents, interface)
    }

    async fn restart(&self) -> StepOutcome {
        let output = run_lenient(self.runner.as_ref(), "netplan", &["apply"], self.limit).await;
        StepOutcome::from_output("applied netplan configuration", &output)
    }
}

#[derive(Debug, Default, Deserialize)]
struct NetplanFile {
    #[serde(default)]
    network: NetplanNetwork,
}

#[derive(Debug, Default, Deserialize)]
struct NetplanNetwork {
    #[serde(default)]
    ethernets: BTreeMap<String, NetplanInterface>,
    #[serde(default)]
    wifis: BTreeMap<String, NetplanInterface>,
    #[serde(default)]
    bridges: BTreeMap<String, NetplanInterface>,
    #[serde(default)]
    bonds: BTreeMap<String, NetplanInterface>,
    #[serde(default)]
    vlans: BTreeMap<String, NetplanInterface>,
}

#[derive(Debug, Default, Deserialize)]
struct NetplanInterface {
    #[serde(default)]
    dhcp4: Option<Value>,
    #[serde(default)]
    addresses: Vec<Value>,
    #[serde(default, rename = "set-name")]
    set_name: Option<String>,
}

/// `*.yaml` files in netplan's processing order.
async fn config_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if matches!(path.extension().and_then(|ext| ext.to_str()), Some("yaml" | "yml")) {
            files.push(path);
        }
    }
    files.sort();
    files
}

pub(super) async fn has_config(dir: &Path) -> bool {
    !config_files(dir).await.is_empty()
}

/// Resolves the mode of `interface` across netplan documents.
///
/// Later documents override earlier ones key by key, like `netplan generate` does.
pub fn mode_for(documents: &[String], interface: &str) -> ConfigurationMode {
    let mut dhcp4: Option<bool> = None;
    let mut has_addresses = false;

    for content in documents {
        let file: NetplanFile = match serde_yaml::from_str(content) {
            Ok(file) => file,
            Err(e) => {
                warn!("Ignoring unparsable netplan document: {e}");
                continue;
            }
        };
        let network = file.network;
        let definitions = network
            .ethernets
            .iter()
            .chain(&network.wifis)
            .chain(&network.bridges)
            .chain(&network.bonds)
            .chain(&network.vlans);

        for (id, definition) in definitions {
            let name = definition.set_name.as_deref().unwrap_or(id);
            if name != interface {
                continue;
            }
            if let Some(value) = &definition.dhcp4 {
                dhcp4 = Some(is_truthy(value));
            }
            if !definition.addresses.is_empty() {
                has_addresses = true;
            }
        }
    }

    match (dhcp4, has_addresses) {
        (Some(true), _) => ConfigurationMode::Dhcp,
        (_, true) => ConfigurationMode::Static,
        _ => ConfigurationMode::Unknown,
    }
}

/// netplan accepts YAML 1.1 booleans such as `yes` and `on`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => matches!(text.to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "y"),
        _ => false,
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
