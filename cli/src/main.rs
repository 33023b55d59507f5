mod commands;
mod pidfile;
mod terminal;

use commands::{CommandLine, Commands, recover, start, status, stop};
use nanowatch_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let daemon: bool = matches!(commands.command, Commands::Start);
    logging::init(commands.verbose, commands.quiet, daemon);

    let config = Config::load(commands.config.as_deref())?;
    let q_level: u8 = commands.quiet;

    match commands.command {
        Commands::Status { json } => {
            if !json {
                print::banner(q_level);
            }
            status::status(config, json, q_level).await
        }
        Commands::Start => start::start(config).await,
        Commands::Stop => stop::stop(&config).await,
        Commands::Recover { force } => {
            print::banner(q_level);
            recover::recover(config, force, q_level).await
        }
    }
}
