use std::path::{Path, PathBuf};

use anyhow::Context;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{debug, warn};

/// The pid file of a running monitor. Removed again by [`PidFile::remove`].
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub async fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tokio::fs::write(path, format!("{}\n", std::process::id()))
            .await
            .with_context(|| format!("Failed to write pid file {}", path.display()))?;
        debug!("Wrote pid file {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub async fn remove(self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!("Could not remove pid file {}: {e}", self.path.display());
        }
    }
}

pub fn parse_pid(content: &str) -> Option<i32> {
    content.trim().parse::<i32>().ok().filter(|pid| *pid > 0)
}

pub async fn read_pid(path: &Path) -> Option<i32> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    parse_pid(&content)
}

/// A process we may not signal still exists.
pub fn is_alive(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

/// The pid recorded in `path`, if that process still exists.
pub async fn running_pid(path: &Path) -> Option<i32> {
    read_pid(path).await.filter(|pid| is_alive(*pid))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
