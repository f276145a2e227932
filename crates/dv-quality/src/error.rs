//! Error types for dv-quality

use crate::gate::LogEntry;
use thiserror::Error;

/// Quality gate errors
#[derive(Error, Debug)]
pub enum QualityError {
    /// A check failed and was configured to abort (Q001)
    #[error(
        "[Q001] {} failed at stage '{}' on {}: {}",
        entry.check_name,
        entry.stage,
        entry.target_table,
        entry.message
    )]
    CheckFailed { entry: Box<LogEntry> },

    /// Store error, including a failed log write (Q002)
    #[error("[Q002] {0}")]
    Db(#[from] dv_db::DbError),

    /// Check could not be evaluated (Q003)
    #[error("[Q003] {0}")]
    Core(#[from] dv_core::CoreError),
}

/// Result type alias for QualityError
pub type QualityResult<T> = Result<T, QualityError>;
