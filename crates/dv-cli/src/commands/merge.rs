//! Merge command implementation - SCD Type 2 history maintenance

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use dv_core::sql_utils::{quote_ident, quote_qualified};
use dv_core::{Clock, Dimension, Project};
use dv_db::Database;
use dv_quality::{
    CheckContext, LogEntry, OnFailure, QualityError, QualityGate, QualityResult, QualitySummary,
};
use dv_scd::{MergeOutcome, Scd2Merger, SurrogateKeyAssigner};
use serde::Serialize;
use std::time::Instant;

use crate::cli::{GlobalArgs, MergeArgs};
use crate::commands::common::{self, ExitCode, RunStatus};

/// Merge run result for a single dimension
#[derive(Debug, Clone, Serialize)]
struct MergeRunResult {
    dimension: String,
    status: RunStatus,
    state_before: Option<String>,
    bootstrapped: bool,
    closed: usize,
    opened: usize,
    surrogate_keys_minted: Option<usize>,
    checks: QualitySummary,
    duration_secs: f64,
    error: Option<String>,
}

/// Merge results output file format
#[derive(Debug, Serialize)]
struct MergeResults {
    timestamp: DateTime<Utc>,
    run_name: String,
    as_of: NaiveDate,
    elapsed_secs: f64,
    success_count: usize,
    failure_count: usize,
    results: Vec<MergeRunResult>,
}

/// What one dimension's pipeline produced before any failure
#[derive(Default)]
struct Progress {
    outcome: Option<MergeOutcome>,
    minted: Option<usize>,
    checks: Vec<LogEntry>,
}

impl Progress {
    /// Keep the log entry of a check, including one that aborted the run
    fn track(&mut self, checked: QualityResult<LogEntry>) -> Result<()> {
        match checked {
            Ok(entry) => {
                self.checks.push(entry);
                Ok(())
            }
            Err(QualityError::CheckFailed { entry }) => {
                self.checks.push((*entry).clone());
                Err(QualityError::CheckFailed { entry }.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Execute the merge command
pub async fn execute(args: &MergeArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let project = common::load_project(global)?;

    if project.dimensions.is_empty() {
        println!("No dimensions found in configured paths");
        return Ok(());
    }

    let dimensions_to_run: Vec<&Dimension> = match &args.dimensions {
        Some(names) => {
            let selected: Vec<&str> = names.split(',').map(|s| s.trim()).collect();
            for name in &selected {
                project.get_dimension(name)?;
            }
            project
                .dimensions
                .iter()
                .filter(|d| selected.contains(&d.name.as_str()))
                .collect()
        }
        None => project.dimensions.iter().collect(),
    };

    let db = common::create_database_connection(&project, global.target.as_deref())?;
    let clock = common::build_clock(global);
    let run_name = common::run_name(global);
    let gate = QualityGate::new(
        db.as_ref(),
        clock.as_ref(),
        project.config.quality.log_table.as_str(),
        run_name.clone(),
    );

    println!(
        "Merging {} dimensions as of {} (run {})...\n",
        dimensions_to_run.len(),
        clock.today(),
        run_name
    );

    let mut success_count = 0;
    let mut failure_count = 0;
    let mut run_results: Vec<MergeRunResult> = Vec::new();

    for dimension in dimensions_to_run {
        let dimension_start = Instant::now();

        if global.verbose {
            eprintln!(
                "[verbose] Merging dimension: {} ({} -> {}, key: {})",
                dimension.name,
                dimension.config.source,
                dimension.config.target,
                dimension.config.business_key
            );
        }

        let mut progress = Progress::default();
        let result = merge_dimension(
            db.as_ref(),
            clock.as_ref(),
            &gate,
            dimension,
            &mut progress,
        )
        .await;
        let duration = dimension_start.elapsed();
        let checks = QualitySummary::from_entries(&progress.checks);
        let outcome = progress.outcome.as_ref();

        let (status, error) = match result {
            Ok(()) => {
                success_count += 1;
                let outcome_line = outcome
                    .map(|o| {
                        if o.bootstrapped {
                            format!("bootstrapped: {}", o.opened)
                        } else {
                            format!("closed: {}, opened: {}", o.closed, o.opened)
                        }
                    })
                    .unwrap_or_default();
                println!(
                    "  ✓ {} ({}) [{}ms]",
                    dimension.name,
                    outcome_line,
                    duration.as_millis()
                );
                (RunStatus::Success, None)
            }
            Err(e) => {
                failure_count += 1;
                println!(
                    "  ✗ {} - {:#} [{}ms]",
                    dimension.name,
                    e,
                    duration.as_millis()
                );
                (RunStatus::Error, Some(format!("{e:#}")))
            }
        };

        run_results.push(MergeRunResult {
            dimension: dimension.name.clone(),
            status,
            state_before: outcome.map(|o| o.state_before.to_string()),
            bootstrapped: outcome.is_some_and(|o| o.bootstrapped),
            closed: outcome.map_or(0, |o| o.closed),
            opened: outcome.map_or(0, |o| o.opened),
            surrogate_keys_minted: progress.minted,
            checks,
            duration_secs: duration.as_secs_f64(),
            error,
        });
    }

    write_merge_results(
        &project,
        MergeResults {
            timestamp: Utc::now(),
            run_name,
            as_of: clock.today(),
            elapsed_secs: start_time.elapsed().as_secs_f64(),
            success_count,
            failure_count,
            results: run_results,
        },
    )?;

    println!();
    println!(
        "Completed: {} succeeded, {} failed",
        success_count, failure_count
    );
    println!("Total time: {}ms", start_time.elapsed().as_millis());

    if failure_count > 0 {
        return Err(ExitCode(4).into());
    }

    Ok(())
}

/// Pre-merge checks, merge, post-merge check, then surrogate keys
async fn merge_dimension(
    db: &dyn Database,
    clock: &dyn Clock,
    gate: &QualityGate<'_>,
    dimension: &Dimension,
    progress: &mut Progress,
) -> Result<()> {
    let config = &dimension.config;
    let keys = vec![config.business_key.clone()];

    if db.relation_exists(&config.source).await? {
        let source_rows = db
            .query(&format!("SELECT * FROM {}", quote_qualified(&config.source)))
            .await
            .context("Failed to read source snapshot")?;
        let ctx = CheckContext::new("pre-merge", &config.target).with_source(&config.source);

        let checked = gate
            .duplicate_keys(
                ctx,
                &source_rows,
                &keys,
                OnFailure::from_abort_flag(config.quality.abort_on_duplicate_keys),
            )
            .await;
        progress.track(checked)?;
        let checked = gate
            .duplicate_rows(
                ctx,
                &source_rows,
                OnFailure::from_abort_flag(config.quality.abort_on_duplicate_rows),
            )
            .await;
        progress.track(checked)?;
    }

    let outcome = Scd2Merger::new(db, clock).merge(config).await?;
    progress.outcome = Some(outcome);

    let current_rows = db
        .query(&format!(
            "SELECT * FROM {} WHERE {} = TRUE",
            quote_qualified(&config.target),
            quote_ident(&config.metadata.is_current)
        ))
        .await
        .context("Failed to read current history rows")?;
    let checked = gate
        .duplicate_keys(
            CheckContext::new("post-merge", &config.target),
            &current_rows,
            &keys,
            OnFailure::from_abort_flag(config.quality.abort_on_duplicate_keys),
        )
        .await;
    progress.track(checked)?;

    if let Some(assigned) = SurrogateKeyAssigner::new(db, clock)
        .assign_opened_today(config)
        .await?
    {
        progress.minted = Some(assigned.minted);
    }

    Ok(())
}

/// Write merge results to JSON file
fn write_merge_results(project: &Project, results: MergeResults) -> Result<()> {
    let target_dir = project.target_dir();
    std::fs::create_dir_all(&target_dir).context("Failed to create target directory")?;
    let results_path = target_dir.join("merge_results.json");
    let results_json =
        serde_json::to_string_pretty(&results).context("Failed to serialize merge results")?;
    std::fs::write(&results_path, results_json).context("Failed to write merge_results.json")?;

    Ok(())
}
