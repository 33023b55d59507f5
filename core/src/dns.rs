//! DNS resolution checks.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, ensure};
use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use nanowatch_protocols::dns::{self, DNS_PORT, DnsAnswer};

const MAX_RESPONSE_LEN: usize = 1232;

#[async_trait]
pub trait Resolver: Send + Sync {
    /// Sends one A query for `name` to `server`.
    async fn query(&self, server: IpAddr, name: &str, limit: Duration) -> anyhow::Result<DnsAnswer>;
}

/// Plain DNS over UDP.
#[derive(Debug, Clone, Copy)]
pub struct UdpResolver {
    port: u16,
}

impl UdpResolver {
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }
}

impl Default for UdpResolver {
    fn default() -> Self {
        Self { port: DNS_PORT }
    }
}

#[async_trait]
impl Resolver for UdpResolver {
    async fn query(&self, server: IpAddr, name: &str, limit: Duration) -> anyhow::Result<DnsAnswer> {
        let id: u16 = rand::random();
        let packet = dns::create_a_packet(name, id)?;

        let bind: SocketAddr = match server {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(bind).await.context("binding UDP socket")?;
        socket
            .connect(SocketAddr::new(server, self.port))
            .await
            .with_context(|| format!("connecting to {server}"))?;

        let exchange = async {
            socket.send(&packet).await?;
            let mut buffer = vec![0u8; MAX_RESPONSE_LEN];
            loop {
                let len = socket.recv(&mut buffer).await?;
                // stray datagrams for an older query
                if let Ok(answer) = dns::parse_answer(&buffer[..len]) {
                    if answer.id == id {
                        return Ok::<DnsAnswer, std::io::Error>(answer);
                    }
                }
            }
        };

        let answer = timeout(limit, exchange)
            .await
            .with_context(|| format!("{server} did not answer within {}s", limit.as_secs()))?
            .with_context(|| format!("querying {server}"))?;
        ensure!(answer.id == id, "mismatched transaction id");
        Ok(answer)
    }
}

/// The first of `servers` that resolves `name`.
pub async fn first_working(
    resolver: &dyn Resolver,
    servers: &[IpAddr],
    name: &str,
    limit: Duration,
) -> Option<IpAddr> {
    for server in servers {
        match resolver.query(*server, name, limit).await {
            Ok(answer) if answer.resolved() => return Some(*server),
            Ok(answer) => debug!("{server} answered {name} with rcode {}", answer.response_code),
            Err(e) => debug!("{server}: {e:#}"),
        }
    }
    None
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
