//! dv-db - Store abstraction for dimvault
//!
//! This crate provides the `Database` trait consumed by the merge, key and
//! quality components, and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{ColumnInfo, Database, LoadMode};
