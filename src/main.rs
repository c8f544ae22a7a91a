//! pcdseq - CLI entry point

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};
use pcdseq::logging;

#[cfg(not(tarpaulin_include))]
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    logging::init(logging::adjust_level(
        config.log_level(),
        cli.verbose,
        cli.quiet,
    ));

    match cli.command {
        Commands::Play(args) => commands::play::handle(&config, &args),
        Commands::List { sequence } => commands::list::handle(&config, &sequence),
        Commands::Inspect { file, json } => commands::inspect::handle(&file, json),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(&config),
            ConfigCommands::Path => commands::config::handle_path(cli.config.as_deref()),
            ConfigCommands::Init { force } => {
                commands::config::handle_init(cli.config.as_deref(), force)
            }
        },
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}
