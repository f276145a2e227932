//! Quality gate harness
//!
//! The checks themselves are pure functions in `dv_core::quality`; this
//! module turns an outcome into a log row and decides whether to halt.

use crate::error::{QualityError, QualityResult};
use chrono::NaiveDateTime;
use dv_core::quality::{self, CheckOutcome, CheckStatus};
use dv_core::sql_utils::{quote_qualified, schema_of};
use dv_core::{Clock, RowSet, Value};
use dv_db::{Database, LoadMode};
use log::{info, warn};
use serde::Serialize;

/// Placeholder written when a check has no source table
const NO_SOURCE: &str = "N/A";

/// Log table columns, in DDL order
const LOG_COLUMNS: [(&str, &str); 11] = [
    ("checked_at", "TIMESTAMP"),
    ("run_name", "VARCHAR"),
    ("check_name", "VARCHAR"),
    ("stage", "VARCHAR"),
    ("target_table", "VARCHAR"),
    ("source_table", "VARCHAR"),
    ("status", "VARCHAR"),
    ("actual_1", "DOUBLE"),
    ("actual_2", "DOUBLE"),
    ("threshold", "DOUBLE"),
    ("message", "VARCHAR"),
];

/// What to do when a check fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Log, then return `QualityError::CheckFailed`
    Abort,
    /// Log and carry on
    Continue,
}

impl OnFailure {
    pub fn from_abort_flag(abort: bool) -> Self {
        if abort {
            OnFailure::Abort
        } else {
            OnFailure::Continue
        }
    }
}

/// Where in the pipeline a check runs and what it looks at
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub stage: &'a str,
    pub target_table: &'a str,
    pub source_table: Option<&'a str>,
}

impl<'a> CheckContext<'a> {
    pub fn new(stage: &'a str, target_table: &'a str) -> Self {
        Self {
            stage,
            target_table,
            source_table: None,
        }
    }

    pub fn with_source(mut self, source_table: &'a str) -> Self {
        self.source_table = Some(source_table);
        self
    }
}

/// One row of the data-quality log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub checked_at: NaiveDateTime,
    pub run_name: String,
    pub check_name: String,
    pub stage: String,
    pub target_table: String,
    pub source_table: String,
    pub status: CheckStatus,
    pub actual_1: f64,
    pub actual_2: Option<f64>,
    pub threshold: f64,
    pub message: String,
}

impl LogEntry {
    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Timestamp(self.checked_at),
            Value::from(self.run_name.as_str()),
            Value::from(self.check_name.as_str()),
            Value::from(self.stage.as_str()),
            Value::from(self.target_table.as_str()),
            Value::from(self.source_table.as_str()),
            Value::from(self.status.to_string()),
            Value::Float(self.actual_1),
            self.actual_2.map_or(Value::Null, Value::Float),
            Value::Float(self.threshold),
            Value::from(self.message.as_str()),
        ]
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Summary of the checks recorded in a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualitySummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl QualitySummary {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let passed = entries.iter().filter(|e| e.passed()).count();
        Self {
            total: entries.len(),
            passed,
            failed: entries.len() - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs checks and appends one log row per check
pub struct QualityGate<'a> {
    db: &'a dyn Database,
    clock: &'a dyn Clock,
    log_table: String,
    run_name: String,
}

impl<'a> QualityGate<'a> {
    pub fn new(
        db: &'a dyn Database,
        clock: &'a dyn Clock,
        log_table: impl Into<String>,
        run_name: impl Into<String>,
    ) -> Self {
        Self {
            db,
            clock,
            log_table: log_table.into(),
            run_name: run_name.into(),
        }
    }

    pub fn log_table(&self) -> &str {
        &self.log_table
    }

    /// Create the log table (and its schema) if it does not exist
    pub async fn ensure_log_table(&self) -> QualityResult<()> {
        if let Some(schema) = schema_of(&self.log_table) {
            self.db.create_schema_if_not_exists(schema).await?;
        }
        let defs: Vec<String> = LOG_COLUMNS
            .iter()
            .map(|(name, ty)| format!("{name} {ty}"))
            .collect();
        self.db
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_qualified(&self.log_table),
                defs.join(", ")
            ))
            .await?;
        Ok(())
    }

    /// Log an outcome, then raise when it failed and `on_failure` is Abort
    ///
    /// The log row is written before anything is raised. A failed log write
    /// is returned as a store error.
    pub async fn record(
        &self,
        outcome: CheckOutcome,
        ctx: CheckContext<'_>,
        on_failure: OnFailure,
    ) -> QualityResult<LogEntry> {
        let entry = LogEntry {
            checked_at: self.clock.now(),
            run_name: self.run_name.clone(),
            check_name: outcome.kind.log_name().to_string(),
            stage: ctx.stage.to_string(),
            target_table: ctx.target_table.to_string(),
            source_table: ctx.source_table.unwrap_or(NO_SOURCE).to_string(),
            status: outcome.status,
            actual_1: outcome.actual_1,
            actual_2: outcome.actual_2,
            threshold: outcome.threshold,
            message: outcome.message,
        };

        self.ensure_log_table().await?;
        let columns = LOG_COLUMNS.iter().map(|(n, _)| n.to_string()).collect();
        let rows = RowSet::from_rows(columns, vec![entry.to_row()])?;
        self.db
            .bulk_load(&self.log_table, &rows, LoadMode::Append)
            .await?;

        if entry.passed() {
            info!(
                "[{}] {} on {}: PASS - {}",
                entry.stage, entry.check_name, entry.target_table, entry.message
            );
            return Ok(entry);
        }

        match on_failure {
            OnFailure::Abort => Err(QualityError::CheckFailed {
                entry: Box::new(entry),
            }),
            OnFailure::Continue => {
                warn!(
                    "[{}] {} on {}: FAIL - {}",
                    entry.stage, entry.check_name, entry.target_table, entry.message
                );
                Ok(entry)
            }
        }
    }

    /// Source row count against target row count
    pub async fn row_count_match(
        &self,
        ctx: CheckContext<'_>,
        source_count: usize,
        target_count: usize,
        on_failure: OnFailure,
    ) -> QualityResult<LogEntry> {
        self.record(
            quality::row_count_match(source_count, target_count),
            ctx,
            on_failure,
        )
        .await
    }

    /// Rows that repeat an earlier row on every column
    pub async fn duplicate_rows(
        &self,
        ctx: CheckContext<'_>,
        data: &RowSet,
        on_failure: OnFailure,
    ) -> QualityResult<LogEntry> {
        self.record(quality::duplicate_rows(data), ctx, on_failure)
            .await
    }

    /// Rows that repeat an earlier row on `keys`
    pub async fn duplicate_keys(
        &self,
        ctx: CheckContext<'_>,
        data: &RowSet,
        keys: &[String],
        on_failure: OnFailure,
    ) -> QualityResult<LogEntry> {
        let outcome = quality::duplicate_keys(data, keys)?;
        self.record(outcome, ctx, on_failure).await
    }

    /// Most recent log entries for this gate's log table, newest first
    pub async fn recent_entries(&self, limit: usize) -> QualityResult<RowSet> {
        if !self.db.relation_exists(&self.log_table).await? {
            return Ok(RowSet::new(
                LOG_COLUMNS.iter().map(|(n, _)| n.to_string()).collect(),
            ));
        }
        Ok(self
            .db
            .query(&format!(
                "SELECT * FROM {} ORDER BY checked_at DESC LIMIT {limit}",
                quote_qualified(&self.log_table)
            ))
            .await?)
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
