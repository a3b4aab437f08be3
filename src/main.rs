use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use crpm_check::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Check(args) => commands::handle_check(args, cli.quiet, cli.verbose),
        Commands::Init { force } => commands::handle_init(force, cli.quiet),
        Commands::Config { show, validate, config } => {
            commands::handle_config(show, validate, config.as_deref(), cli.quiet)
        }
    }
}
