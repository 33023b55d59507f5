use std::sync::Arc;

use anyhow::bail;
use colored::*;
use tracing::debug;

use nanowatch_common::config::Config;
use nanowatch_core::monitor::StatusReport;
use nanowatch_core::runner::SystemRunner;
use nanowatch_core::runtime::{self, log_tails};
use nanowatch_core::system::Components;

use crate::mprint;
use crate::pidfile;
use crate::terminal::{colors, format, print, spinner};

/// Where a report came from.
enum Source {
    Daemon(i32),
    Live,
}

/// Prints the daemon's last report, or a live one, and fails when anything is unhealthy.
pub async fn status(config: Config, json: bool, q_level: u8) -> anyhow::Result<()> {
    let (mut report, source) = match daemon_report(&config).await {
        Some((pid, report)) => (report, Source::Daemon(pid)),
        None => (live_report(config.clone(), json).await?, Source::Live),
    };

    if report.logs.is_empty() {
        let runtime = runtime::from_config(Arc::new(SystemRunner), &config);
        report.logs = log_tails(runtime.as_ref(), &config.services, config.health.log_tail_lines).await;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &source, q_level);
    }
    verdict(&report)
}

fn verdict(report: &StatusReport) -> anyhow::Result<()> {
    let problems = report.problems();
    if problems.is_empty() {
        return Ok(());
    }
    bail!("issues detected: {}", problems.join(", "))
}

async fn daemon_report(config: &Config) -> Option<(i32, StatusReport)> {
    let pid = pidfile::running_pid(&config.pid_file()).await?;
    match StatusReport::read(&config.status_file()).await {
        Ok(report) => Some((pid, report)),
        Err(e) => {
            debug!("Monitor (pid {pid}) is running but its report is unavailable: {e:#}");
            None
        }
    }
}

/// One capture and one health pass, without any recovery.
async fn live_report(config: Config, quiet_spinner: bool) -> anyhow::Result<StatusReport> {
    let components = Components::assemble(config).await?;

    if !quiet_spinner {
        spinner::report_progress("Capturing network snapshot...");
    }
    let snapshot = components.snapshotter.capture().await;

    if !quiet_spinner {
        spinner::report_progress(&format!("Checking {} services...", components.config.services.len()));
    }
    let mut checker = components.health_checker();
    let services = checker.check_all(&components.config.services).await.values().cloned().collect();
    let logs = log_tails(
        components.runtime.as_ref(),
        &components.config.services,
        components.config.health.log_tail_lines,
    )
    .await;
    spinner::finish();

    Ok(StatusReport {
        generated_at: components.clock.utc(),
        backend: components.backend.kind().to_string(),
        runtime: components.runtime.name().to_string(),
        snapshot,
        services,
        last_recovery: None,
        recent_recoveries: Vec::new(),
        logs,
    })
}

fn print_report(report: &StatusReport, source: &Source, q_level: u8) {
    let origin: ColoredString = match source {
        Source::Daemon(pid) => format!("monitor running (pid {pid})").color(colors::GOOD),
        Source::Live => "monitor not running, live check".color(colors::WARN),
    };

    print::header("status", q_level);
    print::aligned_line("Source", origin);
    print::aligned_line("Generated", format::local_time(&report.generated_at));
    print::aligned_line("Backend", report.backend.as_str());
    print::aligned_line("Runtime", report.runtime.as_str());
    mprint!();

    print::header("network", q_level);
    let interface: &str = if report.snapshot.has_interface() {
        &report.snapshot.interface_name
    } else {
        "no interface"
    };
    print::tree_head(0, interface);
    print::as_tree_one_level(format::snapshot_details(&report.snapshot));
    mprint!();

    print::header("services", q_level);
    if report.services.is_empty() {
        print::print_status("No managed services configured");
    }
    for (idx, health) in report.services.iter().enumerate() {
        print::tree_head(idx, &health.service_id);
        print::as_tree_one_level(format::service_details(health));
        if let Some(lines) = report.logs.get(&health.service_id) {
            for line in lines {
                print::print_status(line);
            }
        }
        if idx + 1 != report.services.len() {
            mprint!();
        }
    }

    if let Some(last) = &report.last_recovery {
        mprint!();
        print::header("recoveries", q_level);
        print::aligned_line("Last", format::attempt(last));
        print::aligned_line("Recent", report.recent_recoveries.len().to_string());
    }

    print::end_of_program();
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
