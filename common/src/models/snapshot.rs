use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the primary interface obtains its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigurationMode {
    Dhcp,
    Static,
    Unknown,
}

impl ConfigurationMode {
    /// `Unknown` usually means the backend query failed, not that the mode changed.
    pub fn is_known(self) -> bool {
        self != ConfigurationMode::Unknown
    }
}

impl fmt::Display for ConfigurationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigurationMode::Dhcp => "DHCP",
            ConfigurationMode::Static => "STATIC",
            ConfigurationMode::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// A point-in-time capture of the host's primary network configuration.
///
/// A fresh snapshot is produced on every poll cycle and never modified afterwards.
/// Missing information is represented by `None`/empty values rather than errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub interface_name: String,
    pub ip_address: Option<IpAddr>,
    pub gateway_address: Option<IpAddr>,
    /// Prefix length of the primary address.
    pub prefix_len: Option<u8>,
    pub dns_servers: Vec<IpAddr>,
    pub configuration_mode: ConfigurationMode,
    pub internet_reachable: bool,
    pub captured_at: DateTime<Utc>,
}

impl NetworkSnapshot {
    /// The snapshot produced when nothing about the network could be determined.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            interface_name: String::new(),
            ip_address: None,
            gateway_address: None,
            prefix_len: None,
            dns_servers: Vec::new(),
            configuration_mode: ConfigurationMode::Unknown,
            internet_reachable: false,
            captured_at,
        }
    }

    pub fn has_interface(&self) -> bool {
        !self.interface_name.is_empty()
    }

    /// `address/prefix`, or just the address when the prefix is unknown.
    pub fn cidr(&self) -> Option<String> {
        let ip = self.ip_address?;
        Some(match self.prefix_len {
            Some(prefix) => format!("{ip}/{prefix}"),
            None => ip.to_string(),
        })
    }
}
