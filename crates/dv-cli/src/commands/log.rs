//! Log command implementation - show recent data-quality results

use anyhow::{Context, Result};
use dv_quality::QualityGate;

use crate::cli::{GlobalArgs, LogArgs};
use crate::commands::common;

/// Columns shown, in order
const SHOWN: [&str; 7] = [
    "checked_at",
    "run_name",
    "check_name",
    "stage",
    "target_table",
    "status",
    "message",
];

/// Execute the log command
pub async fn execute(args: &LogArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let db = common::create_database_connection(&project, global.target.as_deref())?;
    let clock = common::build_clock(global);
    let gate = QualityGate::new(
        db.as_ref(),
        clock.as_ref(),
        project.config.quality.log_table.as_str(),
        common::run_name(global),
    );

    let entries = gate
        .recent_entries(args.limit)
        .await
        .context("Failed to read data-quality log")?;

    if entries.is_empty() {
        println!("No data-quality entries in {}", gate.log_table());
        return Ok(());
    }

    let indices = SHOWN
        .iter()
        .map(|name| entries.column_index(name))
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", SHOWN.join(" | "));
    for row in entries.rows() {
        let cells: Vec<String> = indices.iter().map(|&i| row[i].to_string()).collect();
        println!("{}", cells.join(" | "));
    }
    println!("\n{} entries", entries.len());

    Ok(())
}
