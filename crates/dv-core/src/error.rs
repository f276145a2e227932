//! Error types for dv-core

use thiserror::Error;

/// Core error type for dimvault
#[derive(Error, Debug)]
pub enum CoreError {
    /// DV001: Configuration file not found
    #[error("[DV001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// DV002: Invalid configuration value
    #[error("[DV002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// DV003: Dimension definition is invalid
    #[error("[DV003] Invalid dimension '{name}': {reason}")]
    DimensionInvalid { name: String, reason: String },

    /// DV004: Same dimension name defined twice
    #[error("[DV004] Duplicate dimension '{name}' in {path1} and {path2}")]
    DuplicateDimension {
        name: String,
        path1: String,
        path2: String,
    },

    /// DV005: Dimension name not found in the project
    #[error("[DV005] Dimension not found: {name}")]
    DimensionNotFound { name: String },

    /// DV006: Column referenced by name is missing from a row set
    #[error("[DV006] Column '{column}' not found (available: {available})")]
    ColumnNotFound { column: String, available: String },

    /// DV007: Row width does not match the column list
    #[error("[DV007] Row {index} has {found} values, expected {expected}")]
    RowWidthMismatch {
        index: usize,
        found: usize,
        expected: usize,
    },

    /// DV008: A business key maps to more than one surrogate key
    #[error("[DV008] Business key '{business_key}' is mapped to surrogate keys {first} and {second}")]
    SurrogateKeyConflict {
        business_key: String,
        first: i64,
        second: i64,
    },

    /// DV009: Dimension file has the wrong `kind`
    #[error("[DV009] Invalid 'kind' in {path}: expected 'dimensions', found '{found}'")]
    InvalidKind { path: String, found: String },

    /// DV010: IO error
    #[error("[DV010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DV011: IO error with file path context
    #[error("[DV011] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// DV012: YAML parse error
    #[error("[DV012] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
