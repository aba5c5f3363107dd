#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;

use chefctl::cli::{Cli, Commands};
use chefctl::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Install(cmd) => commands::install::execute(cmd)?,
        Commands::Config { command } => commands::config::execute(command)?,
        Commands::Nodes(cmd) => commands::nodes::execute(cmd)?,
        Commands::Hints(cmd) => commands::hints::execute(cmd)?,
    }

    Ok(())
}
