//! Load command implementation - replace a landing table from CSV

use anyhow::{Context, Result};
use dv_core::sql_utils::quote_literal;
use dv_quality::{CheckContext, OnFailure, QualityError, QualityGate};
use std::path::Path;

use crate::cli::{GlobalArgs, LoadArgs};
use crate::commands::common::{self, ExitCode};

/// Stage name recorded for landing checks
const STAGE: &str = "landing";

/// Execute the load command
pub async fn execute(args: &LoadArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let db = common::create_database_connection(&project, global.target.as_deref())?;
    let clock = common::build_clock(global);
    let run_name = common::run_name(global);

    let csv_path = Path::new(&args.csv);
    let csv = csv_path
        .canonicalize()
        .with_context(|| format!("CSV file not found: {}", args.csv))?
        .display()
        .to_string();
    let table = format!("{}.{}", project.config.landing_schema, args.table);

    if global.verbose {
        eprintln!("[verbose] Loading {} into {}", csv, table);
    }

    // Both counts come from DuckDB's CSV reader, so this compares what was
    // read with what landed in the table, not the parse itself.
    let file_rows = db
        .query_count(&format!("SELECT * FROM read_csv_auto({})", quote_literal(&csv)))
        .await
        .context("Failed to read CSV file")?;

    db.create_schema_if_not_exists(&project.config.landing_schema)
        .await
        .context("Failed to create landing schema")?;
    let loaded = db
        .load_csv(&table, &csv)
        .await
        .with_context(|| format!("Failed to load {}", table))?;

    let gate = QualityGate::new(
        db.as_ref(),
        clock.as_ref(),
        project.config.quality.log_table.as_str(),
        run_name,
    );
    let ctx = CheckContext::new(STAGE, &table).with_source(&args.csv);
    let on_failure = OnFailure::from_abort_flag(project.config.quality.abort_on_row_count);

    match gate.row_count_match(ctx, file_rows, loaded, on_failure).await {
        Ok(entry) if entry.passed() => {
            println!("  ✓ {} ({} rows)", table, loaded);
            Ok(())
        }
        Ok(entry) => {
            println!("  ! {} loaded with warnings: {}", table, entry.message);
            Ok(())
        }
        Err(QualityError::CheckFailed { entry }) => {
            println!("  ✗ {} - {}", table, entry.message);
            Err(ExitCode(4).into())
        }
        Err(e) => Err(e).context("Failed to record row count check"),
    }
}
