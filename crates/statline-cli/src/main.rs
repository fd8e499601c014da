use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use statline_cli::commands::{consume, log, report, session, state, status};
use statline_cli::{Cli, Commands, Config};

/// Loads the layered configuration for one command invocation.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so tests that run the binary twice in-process don't panic
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Consume {
            player,
            file,
            quiet,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            consume::run(&config, player, file.as_deref(), *quiet)?;
        }
        Some(Commands::Session { player, before }) => {
            let config = load_config(cli.config.as_deref())?;
            session::run(&config, player, before.as_deref())?;
        }
        Some(Commands::Report {
            player,
            start,
            end,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            report::run(&config, player, start, end, *json)?;
        }
        Some(Commands::State { player, json }) => {
            let config = load_config(cli.config.as_deref())?;
            state::run(&config, player, *json)?;
        }
        Some(Commands::Log {
            player,
            reverse,
            limit,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            log::run(&config, player, *reverse, *limit)?;
        }
        Some(Commands::Status) => {
            let config = load_config(cli.config.as_deref())?;
            status::run(&config)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
