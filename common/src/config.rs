//! Configuration for the monitor.
//!
//! Loads settings from `/etc/nanowatch/config.toml` (or an explicit path) and falls back
//! to defaults that match the Nano Pi deployment: the bell service on port 5000, the news
//! app on port 8000 and the config service on port 5002, all running as Docker containers.

use std::collections::HashSet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/nanowatch/config.toml";

/// Placeholder replaced by the host address in env file templates.
pub const IP_PLACEHOLDER: &str = "{ip}";

/// Upper bound for `network.probe_timeout_secs`.
pub const MAX_PROBE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub host_env: HostEnvConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            network: NetworkConfig::default(),
            dns: DnsConfig::default(),
            health: HealthConfig::default(),
            recovery: RecoveryConfig::default(),
            runtime: RuntimeConfig::default(),
            services: default_services(),
            host_env: HostEnvConfig::default(),
        }
    }
}

/// Polling loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Directory for the pid file and the status report
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_interval() -> u64 {
    30
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("/run/nanowatch")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            state_dir: default_state_dir(),
        }
    }
}

/// Which host network stack to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendPreference {
    #[default]
    Auto,
    NetworkManager,
    Netplan,
    SystemdNetworkd,
    Dhcpcd,
    Ifupdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub backend: BackendPreference,

    /// Interface used when neither the default route nor an addressed interface identifies one
    #[serde(default = "default_fallback_interface")]
    pub fallback_interface: Option<String>,

    /// Well-known address used for the internet reachability probe
    #[serde(default = "default_reachability_target")]
    pub reachability_target: IpAddr,

    /// TCP port tried when ICMP is unavailable
    #[serde(default = "default_reachability_port")]
    pub reachability_port: u16,

    /// Per-probe timeout in seconds, 1 to 3. Also bounds the backend's mode queries.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_route_table")]
    pub route_table: PathBuf,

    #[serde(default = "default_netplan_dir")]
    pub netplan_dir: PathBuf,

    #[serde(default = "default_interfaces_file")]
    pub interfaces_file: PathBuf,

    #[serde(default = "default_dhcpcd_conf")]
    pub dhcpcd_conf: PathBuf,
}

fn default_fallback_interface() -> Option<String> {
    Some("eth0".to_string())
}

fn default_reachability_target() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))
}

fn default_reachability_port() -> u16 {
    53
}

fn default_probe_timeout() -> u64 {
    3
}

fn default_route_table() -> PathBuf {
    PathBuf::from("/proc/net/route")
}

fn default_netplan_dir() -> PathBuf {
    PathBuf::from("/etc/netplan")
}

fn default_interfaces_file() -> PathBuf {
    PathBuf::from("/etc/network/interfaces")
}

fn default_dhcpcd_conf() -> PathBuf {
    PathBuf::from("/etc/dhcpcd.conf")
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            fallback_interface: default_fallback_interface(),
            reachability_target: default_reachability_target(),
            reachability_port: default_reachability_port(),
            probe_timeout_secs: default_probe_timeout(),
            route_table: default_route_table(),
            netplan_dir: default_netplan_dir(),
            interfaces_file: default_interfaces_file(),
            dhcpcd_conf: default_dhcpcd_conf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: PathBuf,

    /// Name looked up to decide whether resolution works
    #[serde(default = "default_check_domain")]
    pub check_domain: String,

    /// Servers written to resolv.conf when none of the current ones answer
    #[serde(default = "default_fallback_servers")]
    pub fallback_servers: Vec<IpAddr>,

    #[serde(default = "default_probe_timeout")]
    pub query_timeout_secs: u64,
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from("/etc/resolv.conf")
}

fn default_check_domain() -> String {
    "google.com".to_string()
}

fn default_fallback_servers() -> Vec<IpAddr> {
    vec![
        IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
        IpAddr::V4(Ipv4Addr::new(8, 8, 4, 4)),
        IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
    ]
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            resolv_conf: default_resolv_conf(),
            check_domain: default_check_domain(),
            fallback_servers: default_fallback_servers(),
            query_timeout_secs: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Host the HTTP health probes connect to
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Consecutive failures before a recovery is requested
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Recent log lines `nanowatch status` shows per service, 0 to skip them
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
}

fn default_probe_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_timeout() -> u64 {
    5
}

fn default_failure_threshold() -> u32 {
    1
}

fn default_log_tail_lines() -> usize {
    3
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_host: default_probe_host(),
            http_timeout_secs: default_http_timeout(),
            failure_threshold: default_failure_threshold(),
            log_tail_lines: default_log_tail_lines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Minimum seconds between the start of two recoveries
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Seconds to wait after restarting the network stack
    #[serde(default = "default_settle")]
    pub network_settle_secs: u64,

    /// Timeout for remediation commands (restarts, container recreation)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_ntp_server")]
    pub ntp_server: String,
}

fn default_cooldown() -> u64 {
    60
}

fn default_settle() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    120
}

fn default_ntp_server() -> String {
    "pool.ntp.org".to_string()
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
            network_settle_secs: default_settle(),
            command_timeout_secs: default_command_timeout(),
            ntp_server: default_ntp_server(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    #[default]
    Docker,
    Systemd,
    Process,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub kind: RuntimeKind,

    /// When set, services are recreated with `docker compose up -d --force-recreate`
    #[serde(default)]
    pub compose_file: Option<PathBuf>,
}

/// A managed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    pub port: u16,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Further endpoints that must answer once the health path does, e.g. `/api/news`
    #[serde(default)]
    pub extra_paths: Vec<String>,

    /// Docker container name (defaults to `id`)
    #[serde(default)]
    pub container: Option<String>,

    /// systemd unit name (defaults to `<id>.service`)
    #[serde(default)]
    pub unit: Option<String>,

    /// Process name looked up by the process runtime (defaults to `id`)
    #[serde(default)]
    pub process_name: Option<String>,

    /// Shell command used by the process runtime to restart the service
    #[serde(default)]
    pub restart_command: Option<String>,
}

fn default_health_path() -> String {
    "/".to_string()
}

impl ServiceConfig {
    pub fn new(id: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            port,
            health_path: default_health_path(),
            extra_paths: Vec::new(),
            container: None,
            unit: None,
            process_name: None,
            restart_command: None,
        }
    }

    pub fn container_name(&self) -> &str {
        self.container.as_deref().unwrap_or(&self.id)
    }

    pub fn unit_name(&self) -> String {
        self.unit.clone().unwrap_or_else(|| format!("{}.service", self.id))
    }

    pub fn process_name(&self) -> &str {
        self.process_name.as_deref().unwrap_or(&self.id)
    }

    pub fn with_extra_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.extra_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn health_url(&self, host: &str) -> String {
        self.url(host, &self.health_path)
    }

    /// The health URL followed by one URL per extra path.
    pub fn probe_urls(&self, host: &str) -> Vec<String> {
        std::iter::once(self.health_url(host))
            .chain(self.extra_paths.iter().map(|path| self.url(host, path)))
            .collect()
    }

    fn url(&self, host: &str, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("http://{host}:{}{path}", self.port)
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("bellapp", 5000),
        ServiceConfig::new("newsapp", 8000).with_extra_paths(["/api/news", "/api/settings"]),
        ServiceConfig::new("config_service", 5002),
    ]
}

/// The env file that embeds the host address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEnvConfig {
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    #[serde(default = "default_env_entries")]
    pub entries: Vec<EnvEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub key: String,
    /// Value template; every `{ip}` is replaced with the host address
    pub template: String,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
        }
    }

    pub fn render(&self, ip: &str) -> String {
        self.template.replace(IP_PLACEHOLDER, ip)
    }
}

fn default_env_file() -> PathBuf {
    PathBuf::from("/opt/bell-news/.env")
}

fn default_env_entries() -> Vec<EnvEntry> {
    vec![
        EnvEntry::new("HOST_IP", "{ip}"),
        EnvEntry::new("APP_URL", "http://{ip}:8000"),
    ]
}

impl Default for HostEnvConfig {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            entries: default_env_entries(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, [`CONFIG_PATH`] is used when present and
    /// the built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path: &Path = match path {
            Some(path) => path,
            None => {
                let default_path = Path::new(CONFIG_PATH);
                if !default_path.exists() {
                    info!("No config file at {CONFIG_PATH}, using defaults");
                    let config = Self::default();
                    config.validate()?;
                    return Ok(config);
                }
                default_path
            }
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content, path)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.interval_secs == 0 {
            return Err(ConfigError::Invalid("monitor.interval_secs must be greater than 0".into()));
        }
        if self.health.failure_threshold == 0 {
            return Err(ConfigError::Invalid("health.failure_threshold must be at least 1".into()));
        }
        if !(1..=MAX_PROBE_TIMEOUT_SECS).contains(&self.network.probe_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "network.probe_timeout_secs must be between 1 and {MAX_PROBE_TIMEOUT_SECS}"
            )));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for service in &self.services {
            if !seen.insert(service.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate service id '{}'", service.id)));
            }
        }

        for entry in &self.host_env.entries {
            if entry.key.trim().is_empty() || entry.key.contains('=') {
                return Err(ConfigError::Invalid(format!("invalid env key '{}'", entry.key)));
            }
            if !entry.template.contains(IP_PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "template for '{}' does not contain {IP_PLACEHOLDER}",
                    entry.key
                )));
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.network.probe_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery.command_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.recovery.cooldown_secs)
    }

    pub fn pid_file(&self) -> PathBuf {
        self.monitor.state_dir.join("nanowatch.pid")
    }

    pub fn status_file(&self) -> PathBuf {
        self.monitor.state_dir.join("status.json")
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
