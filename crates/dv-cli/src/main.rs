//! dimvault CLI - SCD Type 2 dimension history for DuckDB

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{keys, load, log as log_cmd, merge};

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Load(args) => load::execute(args, &cli.global).await,
        cli::Commands::Merge(args) => merge::execute(args, &cli.global).await,
        cli::Commands::Keys(args) => keys::execute(args, &cli.global).await,
        cli::Commands::Log(args) => log_cmd::execute(args, &cli.global).await,
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match run(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if let Some(code) = err.downcast_ref::<ExitCode>() {
                return std::process::ExitCode::from(code.0);
            }
            eprintln!("Error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
