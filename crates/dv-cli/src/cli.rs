//! CLI argument definitions using clap derive API

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// dimvault - SCD Type 2 dimension history for DuckDB
#[derive(Parser, Debug)]
#[command(name = "dv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Run identifier written to the data-quality log (default: generated)
    #[arg(long, global = true)]
    pub run_name: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    pub as_of: Option<NaiveDate>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace a landing table from a CSV file and check its row count
    Load(LoadArgs),

    /// Merge source snapshots into dimension history tables
    Merge(MergeArgs),

    /// Assign surrogate keys to the versions opened today
    Keys(KeysArgs),

    /// Show recent data-quality log entries
    Log(LogArgs),
}

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// CSV file to load
    pub csv: String,

    /// Landing table name (created in the configured landing schema)
    #[arg(long)]
    pub table: String,
}

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Dimension names to merge (comma-separated, default: all)
    #[arg(short, long)]
    pub dimensions: Option<String>,
}

/// Arguments for the keys command
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Dimension to assign surrogate keys for
    #[arg(short, long)]
    pub dimension: String,
}

/// Arguments for the log command
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
