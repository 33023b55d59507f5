use anyhow::bail;
use colored::*;
use is_root::is_root;
use tracing::warn;

use nanowatch_common::config::Config;
use nanowatch_common::models::TriggerReason;
use nanowatch_common::success;
use nanowatch_core::recovery::RecoveryResult;
use nanowatch_core::system::Components;

use crate::pidfile;
use crate::terminal::{colors, format, print};

/// Runs the pipeline once with trigger MANUAL.
///
/// A running monitor owns recovery, so this refuses to run next to it unless `force` is set.
pub async fn recover(config: Config, force: bool, q_level: u8) -> anyhow::Result<()> {
    if let Some(pid) = pidfile::running_pid(&config.pid_file()).await {
        if !force {
            bail!("nanowatch is running (pid {pid}) and recovers on its own; stop it first or pass --force");
        }
        warn!("The monitor (pid {pid}) is running and may start its own recovery alongside this one");
    }
    if !is_root() {
        warn!("Not running as root, most recovery steps will fail");
    }

    let components = Components::assemble(config).await?;
    print::header("recovery", q_level);

    let (attempt, steps) = match components.orchestrator.recover(TriggerReason::Manual).await {
        RecoveryResult::Executed { attempt, steps } => (attempt, steps),
        RecoveryResult::CoolingDown { remaining } => {
            bail!("recovery is cooling down for another {}s", remaining.as_secs())
        }
        RecoveryResult::AlreadyRunning => bail!("a recovery is already running"),
    };

    print::as_tree_one_level(format::step_details(&steps));
    print::fat_separator();

    let failed: usize = steps.iter().filter(|step| step.status.is_failure()).count();
    if attempt.succeeded {
        let summary: ColoredString = format!("Recovery complete: {} steps", steps.len()).color(colors::GOOD).bold();
        match q_level {
            0 => print::centerln(&summary.to_string()),
            _ => success!("{}", summary),
        }
        Ok(())
    } else {
        bail!("recovery finished with {failed} failed step(s)")
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
