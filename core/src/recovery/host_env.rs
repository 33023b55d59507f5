use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use nanowatch_common::config::{EnvEntry, HostEnvConfig};

use super::{RemediationStep, StepOutcome, replace_file};
use crate::snapshot::NetworkSnapshotter;

/// Points the `KEY=value` entries of the application's env file at the current address.
pub struct RewriteHostEnv {
    snapshotter: Arc<NetworkSnapshotter>,
    env_file: PathBuf,
    entries: Vec<EnvEntry>,
}

impl RewriteHostEnv {
    pub fn new(snapshotter: Arc<NetworkSnapshotter>, config: &HostEnvConfig) -> Self {
        Self {
            snapshotter,
            env_file: config.env_file.clone(),
            entries: config.entries.clone(),
        }
    }
}

#[async_trait]
impl RemediationStep for RewriteHostEnv {
    fn name(&self) -> &'static str {
        "update host address"
    }

    async fn run(&self) -> StepOutcome {
        if self.entries.is_empty() {
            return StepOutcome::skipped("no entries configured");
        }

        let snapshot = self.snapshotter.capture().await;
        let Some(ip) = snapshot.ip_address else {
            return StepOutcome::failed("no host address to write");
        };
        let ip = ip.to_string();

        let current = match tokio::fs::read_to_string(&self.env_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return StepOutcome::failed(format!("cannot read {}: {e}", self.env_file.display())),
        };

        let updated = rewrite_env(&current, &self.entries, &ip);
        if updated == current {
            return StepOutcome::skipped(format!("{} already uses {ip}", self.env_file.display()));
        }

        match replace_file(&self.env_file, &updated).await {
            Ok(()) => {
                let keys: Vec<&str> = self.entries.iter().map(|entry| entry.key.as_str()).collect();
                StepOutcome::succeeded(format!(
                    "set {} to {ip} in {}",
                    keys.join(", "),
                    self.env_file.display()
                ))
            }
            Err(e) => StepOutcome::failed(format!("cannot write {}: {e}", self.env_file.display())),
        }
    }
}

/// Renders `entries` for `ip` into an env file.
///
/// Existing assignments keep their `export` prefix and quoting. Unrelated lines, comments and
/// a missing final newline are left as they were; missing keys are appended.
pub fn rewrite_env(content: &str, entries: &[EnvEntry], ip: &str) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut lines: Vec<String> = Vec::new();

    for line in content.lines() {
        match replace_assignment(line, entries, ip) {
            Some((key, replaced)) => {
                seen.insert(key);
                lines.push(replaced);
            }
            None => lines.push(line.to_string()),
        }
    }

    let mut appended = false;
    for entry in entries {
        if !seen.contains(entry.key.as_str()) {
            lines.push(format!("{}={}", entry.key, entry.render(ip)));
            appended = true;
        }
    }

    let mut rendered = lines.join("\n");
    let final_newline = appended || content.is_empty() || content.ends_with('\n');
    if final_newline && !rendered.is_empty() {
        rendered.push('\n');
    }
    rendered
}

fn replace_assignment<'e>(line: &str, entries: &'e [EnvEntry], ip: &str) -> Option<(&'e str, String)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let (export, assignment) = match trimmed.strip_prefix("export ") {
        Some(rest) => ("export ", rest),
        None => ("", trimmed),
    };
    let (key, value) = assignment.split_once('=')?;
    let entry = entries.iter().find(|entry| entry.key == key.trim())?;

    let rendered = entry.render(ip);
    let value = match value.trim().chars().next() {
        Some(quote @ ('"' | '\'')) => format!("{quote}{rendered}{quote}"),
        _ => rendered,
    };
    Some((entry.key.as_str(), format!("{export}{}={value}", entry.key)))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
