//! Error types for dv-scd

use dv_core::CoreError;
use dv_db::DbError;
use thiserror::Error;

/// Merge and key-assignment errors
#[derive(Error, Debug)]
pub enum ScdError {
    /// History table lacks content columns present in the source (S001)
    #[error("[S001] Target '{target}' is missing source columns: {}", missing.join(", "))]
    SchemaMismatch { target: String, missing: Vec<String> },

    /// Key table has an unexpected shape (S002)
    #[error("[S002] Key table '{table}' is invalid: {reason}")]
    KeyTableInvalid { table: String, reason: String },

    /// Store error (S003)
    #[error("[S003] {0}")]
    Db(#[from] DbError),

    /// Core error (S004)
    #[error("[S004] {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for ScdError
pub type ScdResult<T> = Result<T, ScdError>;
