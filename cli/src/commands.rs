pub mod recover;
pub mod start;
pub mod status;
pub mod stop;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nanowatch", version)]
#[command(about = "Keeps a Nano Pi's network and services reachable.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: /etc/nanowatch/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More output, repeat for more detail
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less output, repeat for less
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the network snapshot and service health
    #[command(alias = "st")]
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the monitoring loop in the foreground
    Start,
    /// Stop a running monitor
    Stop,
    /// Run the recovery pipeline once
    #[command(alias = "r")]
    Recover {
        /// Run even though a monitor is running
        #[arg(long)]
        force: bool,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
