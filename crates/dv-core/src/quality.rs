//! Pure data-quality checks
//!
//! Each check looks at one or two datasets and returns a [`CheckOutcome`].
//! Logging and aborting are the caller's business.

use crate::error::CoreResult;
use crate::value::RowSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Result status of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Kind of check, with the name written to the log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    RowCountMatch,
    DuplicateRows,
    DuplicateKeys,
}

impl CheckKind {
    pub fn log_name(&self) -> &'static str {
        match self {
            CheckKind::RowCountMatch => "Row Count Match",
            CheckKind::DuplicateRows => "Duplicate Row Check",
            CheckKind::DuplicateKeys => "Duplicate Key Check",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log_name())
    }
}

/// What a check measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub actual_1: f64,
    pub actual_2: Option<f64>,
    pub threshold: f64,
    pub message: String,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Pass
    }
}

/// Compare two row counts; any difference fails.
pub fn row_count_match(source_count: usize, target_count: usize) -> CheckOutcome {
    let (status, message) = if source_count == target_count {
        (CheckStatus::Pass, format!("Counts match ({target_count})"))
    } else {
        (
            CheckStatus::Fail,
            format!("Mismatch: Source has {source_count}, Target has {target_count}"),
        )
    };
    CheckOutcome {
        kind: CheckKind::RowCountMatch,
        status,
        actual_1: source_count as f64,
        actual_2: Some(target_count as f64),
        threshold: 0.0,
        message,
    }
}

/// Compare the row counts of two datasets.
pub fn row_count_match_sets(source: &RowSet, target: &RowSet) -> CheckOutcome {
    row_count_match(source.len(), target.len())
}

/// Count rows identical on every column to an earlier row.
pub fn duplicate_rows(data: &RowSet) -> CheckOutcome {
    let all: Vec<usize> = (0..data.columns().len()).collect();
    let count = count_repeats(data, &all);
    let (status, message) = if count == 0 {
        (CheckStatus::Pass, "No duplicate rows found".to_string())
    } else {
        (CheckStatus::Fail, format!("Found {count} duplicate rows"))
    };
    CheckOutcome {
        kind: CheckKind::DuplicateRows,
        status,
        actual_1: count as f64,
        actual_2: None,
        threshold: 0.0,
        message,
    }
}

/// Count rows whose `keys` tuple repeats an earlier row's.
pub fn duplicate_keys(data: &RowSet, keys: &[String]) -> CoreResult<CheckOutcome> {
    let indices = keys
        .iter()
        .map(|k| data.column_index(k))
        .collect::<CoreResult<Vec<_>>>()?;
    let count = count_repeats(data, &indices);
    let key_list = format!("[{}]", keys.join(", "));
    let (status, message) = if count == 0 {
        (
            CheckStatus::Pass,
            format!("Unique keys confirmed on {key_list}"),
        )
    } else {
        (
            CheckStatus::Fail,
            format!("Found {count} duplicate keys on {key_list}"),
        )
    };
    Ok(CheckOutcome {
        kind: CheckKind::DuplicateKeys,
        status,
        actual_1: count as f64,
        actual_2: None,
        threshold: 0.0,
        message,
    })
}

/// Rows beyond the first occurrence of each distinct projection.
/// NULLs compare equal to each other and unequal to everything else.
fn count_repeats(data: &RowSet, indices: &[usize]) -> usize {
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(data.len());
    data.rows()
        .iter()
        .filter(|row| {
            let projected = indices.iter().map(|&i| row[i].canonical()).collect();
            !seen.insert(projected)
        })
        .count()
}

#[cfg(test)]
#[path = "quality_test.rs"]
mod tests;
