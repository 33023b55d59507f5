use chrono::Local;
use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::registry::LookupSpan;

use nanowatch_common::log::SUCCESS_TARGET;

use crate::terminal::print::PRINT_TARGET;
use crate::terminal::spinner::TerminalOutput;

pub struct NanowatchFormatter {
    timestamps: bool,
}

impl NanowatchFormatter {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }
}

impl<S, N> FormatEvent<S, N> for NanowatchFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            return writeln!(writer);
        }

        if self.timestamps {
            let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            write!(writer, "{} ", now.bright_black())?;
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = if meta.target() == SUCCESS_TARGET {
            ("[✓]", |s| s.bright_green().bold())
        } else {
            match *meta.level() {
                Level::TRACE => ("[ ]", |s| s.dimmed()),
                Level::DEBUG => ("[?]", |s| s.blue()),
                Level::INFO => ("[+]", |s| s.green().bold()),
                Level::WARN => ("[*]", |s| s.yellow().bold()),
                Level::ERROR => ("[-]", |s| s.red().bold()),
            }
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Filter directive implied by the `-v`/`-q` counts, if any were given.
fn verbosity_directive(verbose: u8, quiet: u8) -> Option<&'static str> {
    match (verbose, quiet) {
        (_, 1) => Some("warn"),
        (_, q) if q > 1 => Some("error"),
        (0, _) => None,
        (1, _) => Some("debug"),
        _ => Some("trace"),
    }
}

fn build_filter(verbose: u8, quiet: u8, rust_log: Option<String>) -> EnvFilter {
    let base: String = match verbosity_directive(verbose, quiet) {
        Some(directive) => directive.to_string(),
        None => rust_log.unwrap_or_else(|| "info".to_string()),
    };
    EnvFilter::try_new(format!("{base},{PRINT_TARGET}=info")).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. `timestamps` prefixes every record with the local time.
pub fn init(verbose: u8, quiet: u8, timestamps: bool) {
    let rust_log: Option<String> = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose, quiet, rust_log))
        .event_format(NanowatchFormatter::new(timestamps))
        .with_writer(TerminalOutput)
        .try_init();
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
