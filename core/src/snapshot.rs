use std::net::IpAddr;
use std::sync::Arc;

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;
use tracing::{debug, warn};

use nanowatch_common::clock::Clock;
use nanowatch_common::models::{ConfigurationMode, NetworkSnapshot};
use nanowatch_common::network::interface::{PrimaryInterface, select_primary_interface};
use nanowatch_common::utils::interface::NetworkInterfaceExtension;

use crate::backend::NetworkBackend;
use crate::network::{DefaultRoute, NetworkInspector};

/// Captures [`NetworkSnapshot`]s of the primary interface.
pub struct NetworkSnapshotter {
    inspector: Arc<dyn NetworkInspector>,
    backend: Arc<dyn NetworkBackend>,
    clock: Arc<dyn Clock>,
    fallback_interface: Option<String>,
}

impl NetworkSnapshotter {
    pub fn new(
        inspector: Arc<dyn NetworkInspector>,
        backend: Arc<dyn NetworkBackend>,
        clock: Arc<dyn Clock>,
        fallback_interface: Option<String>,
    ) -> Self {
        Self {
            inspector,
            backend,
            clock,
            fallback_interface,
        }
    }

    pub fn backend(&self) -> &Arc<dyn NetworkBackend> {
        &self.backend
    }

    /// Never fails. When no interface can be selected the snapshot is empty and unreachable.
    pub async fn capture(&self) -> NetworkSnapshot {
        let captured_at = self.clock.utc();
        let interfaces: Vec<NetworkInterface> = self.inspector.interfaces();
        let route: Option<DefaultRoute> = self.inspector.default_route().await;

        let Some(PrimaryInterface { interface, selection }) = select_primary_interface(
            &interfaces,
            route.as_ref().map(|route| route.interface.as_str()),
            self.fallback_interface.as_deref(),
        ) else {
            warn!("No network interface could be selected");
            return NetworkSnapshot::empty(captured_at);
        };
        debug!("Primary interface {} ({selection:?})", interface.name);

        let net: Option<IpNetwork> = interface.get_primary_net();
        let gateway: Option<IpAddr> = route
            .filter(|route| route.interface == interface.name)
            .and_then(|route| route.gateway);

        let dns_servers = self.inspector.dns_servers().await;
        let configuration_mode: ConfigurationMode = self.backend.configuration_mode(&interface.name).await;
        let internet_reachable = self.inspector.internet_reachable().await;

        NetworkSnapshot {
            interface_name: interface.name,
            ip_address: net.map(|net| net.ip()),
            gateway_address: gateway,
            prefix_len: net.map(|net| net.prefix()),
            dns_servers,
            configuration_mode,
            internet_reachable,
            captured_at,
        }
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
