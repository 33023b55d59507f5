use std::time::Duration;

use anyhow::{Context, bail};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::time::Instant;
use tracing::{info, warn};

use nanowatch_common::config::Config;
use nanowatch_common::success;

use crate::pidfile;

const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub async fn stop(config: &Config) -> anyhow::Result<()> {
    let pid_path = config.pid_file();
    let Some(pid) = pidfile::read_pid(&pid_path).await else {
        info!("nanowatch is not running");
        return Ok(());
    };

    if !pidfile::is_alive(pid) {
        warn!("Removing stale pid file {} (pid {pid})", pid_path.display());
        let _ = tokio::fs::remove_file(&pid_path).await;
        return Ok(());
    }

    kill(Pid::from_raw(pid), Signal::SIGTERM).with_context(|| format!("Failed to send SIGTERM to pid {pid}"))?;
    info!("Sent SIGTERM to pid {pid}, waiting for it to exit");

    let deadline = Instant::now() + STOP_TIMEOUT;
    while Instant::now() < deadline {
        if !pidfile::is_alive(pid) {
            success!("nanowatch (pid {pid}) stopped");
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    bail!("nanowatch (pid {pid}) did not exit within {}s", STOP_TIMEOUT.as_secs())
}
