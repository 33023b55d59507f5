use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::runner::CommandRunner;

/// Single ICMP echo through `ping`, falling back to a TCP probe.
///
/// Never fails: anything that is not a positive answer within `limit` counts as unreachable.
pub async fn is_reachable(runner: &dyn CommandRunner, target: IpAddr, port: u16, limit: Duration) -> bool {
    if runner.exists("ping") && ping_probe(runner, target, limit).await {
        return true;
    }
    handshake_probe(SocketAddr::new(target, port), limit).await
}

async fn ping_probe(runner: &dyn CommandRunner, target: IpAddr, limit: Duration) -> bool {
    let wait_secs: String = limit.as_secs().max(1).to_string();
    let target_str: String = target.to_string();
    let args = ["-c", "1", "-W", wait_secs.as_str(), target_str.as_str()];

    // ping enforces -W itself; the extra second covers process start-up
    match runner.run("ping", &args, limit + Duration::from_secs(1)).await {
        Ok(output) => output.success,
        Err(e) => {
            debug!("ping unavailable: {e}");
            false
        }
    }
}

/// TCP connect to `addr`. A refused connection still proves the path works.
pub async fn handshake_probe(addr: SocketAddr, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => true,
        Ok(Err(e)) => {
            debug!("TCP probe to {addr} failed: {e}");
            false
        }
        Err(_elapsed) => false,
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
