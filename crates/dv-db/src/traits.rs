//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use dv_core::{RowSet, Statement};

/// A column as reported by the store catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// How [`Database::bulk_load`] treats an existing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Drop and recreate the table from the row set
    Replace,
    /// Insert into the table by column name, creating it when absent
    Append,
}

/// Relational store consumed by the SCD2 merge, key assignment and quality gate
///
/// Every method is one store round trip; callers await them strictly in
/// sequence. Implementations must be Send + Sync.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a relational-algebra statement, returns affected rows
    ///
    /// The default renders the statement with its `Display` SQL.
    async fn run(&self, statement: &Statement) -> DbResult<usize> {
        let sql = statement.to_string();
        log::debug!("{}: {}", self.db_type(), sql);
        self.execute(&sql).await
    }

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Columns of a table or view in physical order
    ///
    /// Returns `DbError::TableNotFound` when the relation is absent.
    async fn describe(&self, name: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Run a query and collect every row
    async fn query(&self, sql: &str) -> DbResult<RowSet>;

    /// Number of rows a query returns
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Load an in-memory row set into a table, returns rows written
    async fn bulk_load(&self, table: &str, rows: &RowSet, mode: LoadMode) -> DbResult<usize>;

    /// Replace a table with the contents of a CSV file, returns rows loaded
    async fn load_csv(&self, table: &str, path: &str) -> DbResult<usize>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Drop a table or view if it exists
    async fn drop_if_exists(&self, name: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
