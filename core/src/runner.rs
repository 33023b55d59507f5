//! OS command execution.
//!
//! Everything the monitor does to the host goes through [`CommandRunner`] so the
//! decision logic can be exercised without touching a real system.

use std::env;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nanowatch_common::error::CommandError;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// The most useful single line to put into a log message.
    pub fn summary(&self) -> String {
        let text = if self.stderr.trim().is_empty() { &self.stdout } else { &self.stderr };
        text.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(if self.success { "ok" } else { "no output" })
            .to_string()
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, killing it once `limit` elapses.
    async fn run(&self, program: &str, args: &[&str], limit: Duration) -> Result<CommandOutput, CommandError>;

    /// Whether `program` can be found on the search path.
    fn exists(&self, program: &str) -> bool;
}

/// Runs commands on the local host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str], limit: Duration) -> Result<CommandOutput, CommandError> {
        debug!("Executing command: {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => CommandError::NotFound(program.to_string()),
                _ => CommandError::Io {
                    program: program.to_string(),
                    source,
                },
            })?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| CommandError::Io {
                program: program.to_string(),
                source,
            })?,
            Err(_elapsed) => {
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout: limit,
                });
            }
        };

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn exists(&self, program: &str) -> bool {
        if program.contains('/') {
            return Path::new(program).is_file();
        }
        env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

/// Runs a command and folds "could not run" into a failed output.
pub async fn run_lenient(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
    limit: Duration,
) -> CommandOutput {
    match runner.run(program, args, limit).await {
        Ok(output) => output,
        Err(e) => CommandOutput::failed(e.to_string()),
    }
}

/// `systemctl is-active --quiet <unit>`
pub async fn is_unit_active(runner: &dyn CommandRunner, unit: &str, limit: Duration) -> bool {
    if !runner.exists("systemctl") {
        return false;
    }
    run_lenient(runner, "systemctl", &["is-active", "--quiet", unit], limit)
        .await
        .success
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
