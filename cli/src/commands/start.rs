use anyhow::{Context, bail};
use is_root::is_root;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::watch;
use tracing::{info, warn};

use nanowatch_common::config::Config;
use nanowatch_core::system::Components;

use crate::pidfile::{self, PidFile};

pub async fn start(config: Config) -> anyhow::Result<()> {
    if !is_root() {
        warn!("Not running as root, network and service restarts will most likely fail");
    }

    let pid_path = config.pid_file();
    if let Some(pid) = pidfile::running_pid(&pid_path).await {
        bail!("nanowatch is already running (pid {pid})");
    }

    let components = Components::assemble(config).await?;
    info!(
        "Backend: {}, runtime: {}, {} services, pipeline: {}",
        components.backend.kind(),
        components.runtime.name(),
        components.config.services.len(),
        components.orchestrator.step_names().join(" > ")
    );

    let terminate = signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let interrupt = signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let pid_file = PidFile::create(&pid_path).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signals = tokio::spawn(forward_signals(terminate, interrupt, shutdown_tx));

    components.monitor().run(shutdown_rx).await;

    signals.abort();
    pid_file.remove().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn forward_signals(mut terminate: Signal, mut interrupt: Signal, shutdown: watch::Sender<bool>) {
    tokio::select! {
        _ = terminate.recv() => info!("SIGTERM received, shutting down"),
        _ = interrupt.recv() => info!("SIGINT received, shutting down"),
    }
    let _ = shutdown.send(true);
    // The sender stays alive until the task is aborted.
    std::future::pending::<()>().await;
}
