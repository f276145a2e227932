//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, Database, LoadMode};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::{params_from_iter, Connection};
use dv_core::sql_utils::{quote_ident, quote_literal, quote_qualified, split_qualified_name};
use dv_core::{RowSet, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| classify(e, sql))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(|e| classify(e, sql))
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let wrapped = format!("SELECT COUNT(*) FROM ({sql})");
        let count: i64 = conn
            .query_row(&wrapped, [], |row| row.get(0))
            .map_err(|e| classify(e, sql))?;
        Ok(count as usize)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified_name(name);
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn describe_sync(&self, name: &str) -> DbResult<Vec<ColumnInfo>> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified_name(name);
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map(duckdb::params![schema, table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(DbError::TableNotFound(name.to_string()));
        }
        Ok(columns)
    }

    /// Column names and DuckDB types of a query's result.
    fn describe_query(conn: &Connection, sql: &str) -> DbResult<Vec<ColumnInfo>> {
        let mut stmt = conn
            .prepare(&format!("DESCRIBE {sql}"))
            .map_err(|e| classify(e, sql))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })
            .map_err(|e| classify(e, sql))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify(e, sql))?;
        Ok(columns)
    }

    /// Run a query and collect typed rows.
    ///
    /// Columns whose type has no `Value` counterpart are read in DuckDB's
    /// VARCHAR form; the row set keeps their declared type so a bulk load
    /// casts them back. Column metadata is read after the rows are collected;
    /// DuckDB cannot report it before the statement has executed.
    fn query_sync(&self, sql: &str) -> DbResult<RowSet> {
        let conn = self.lock()?;
        let described = Self::describe_query(&conn, sql)?;

        let to_run = if described.iter().all(|c| reads_natively(&c.data_type)) {
            sql.to_string()
        } else {
            let items: Vec<String> = described
                .iter()
                .map(|c| {
                    let ident = quote_ident(&c.name);
                    if reads_natively(&c.data_type) {
                        ident
                    } else {
                        format!("CAST({ident} AS VARCHAR) AS {ident}")
                    }
                })
                .collect();
            format!("SELECT {} FROM ({sql}) AS \"q\"", items.join(", "))
        };

        let mut stmt = conn.prepare(&to_run).map_err(|e| classify(e, sql))?;
        let raw_rows: Vec<Vec<DuckValue>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count).map(|i| row.get::<_, DuckValue>(i)).collect()
            })
            .map_err(|e| classify(e, sql))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| classify(e, sql))?;

        let columns: Vec<String> = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
            .collect();
        let rows = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(from_duck).collect::<DbResult<Vec<_>>>())
            .collect::<DbResult<Vec<_>>>()?;
        let types = described
            .into_iter()
            .map(|c| (!is_null_type(&c.data_type)).then_some(c.data_type))
            .collect();

        Ok(RowSet::from_rows(columns, rows)?.with_declared_types(types)?)
    }

    fn bulk_load_sync(&self, table: &str, rows: &RowSet, mode: LoadMode) -> DbResult<usize> {
        let exists = self.relation_exists_sync(table)?;
        let types: Vec<String> = match (mode, exists) {
            (LoadMode::Append, true) => {
                let described = self.describe_sync(table)?;
                rows.columns()
                    .iter()
                    .map(|col| {
                        described
                            .iter()
                            .find(|c| &c.name == col)
                            .map(|c| c.data_type.clone())
                            .ok_or_else(|| DbError::BulkLoadError {
                                table: table.to_string(),
                                message: format!("column '{col}' does not exist in target"),
                            })
                    })
                    .collect::<DbResult<_>>()?
            }
            _ => (0..rows.columns().len())
                .map(|i| rows.column_type(i).to_string())
                .collect(),
        };

        let conn = self.lock()?;
        let qualified = quote_qualified(table);
        if mode == LoadMode::Replace || !exists {
            let defs: Vec<String> = rows
                .columns()
                .iter()
                .zip(&types)
                .map(|(col, ty)| format!("{} {ty}", quote_ident(col)))
                .collect();
            let verb = if mode == LoadMode::Replace {
                "CREATE OR REPLACE TABLE"
            } else {
                "CREATE TABLE"
            };
            let ddl = format!("{verb} {qualified} ({})", defs.join(", "));
            conn.execute_batch(&ddl).map_err(|e| classify(e, &ddl))?;
        }

        if rows.is_empty() {
            return Ok(0);
        }

        let cols: Vec<String> = rows.columns().iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = types.iter().map(|ty| format!("CAST(? AS {ty})")).collect();
        let insert = format!(
            "INSERT INTO {qualified} ({}) VALUES ({})",
            cols.join(", "),
            placeholders.join(", ")
        );

        conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> DbResult<usize> {
            let mut stmt = conn.prepare(&insert).map_err(|e| classify(e, &insert))?;
            let mut written = 0;
            for row in rows.rows() {
                written += stmt.execute(params_from_iter(row.iter().map(to_duck)))?;
            }
            Ok(written)
        })();

        match result {
            Ok(written) => {
                conn.execute_batch("COMMIT")?;
                Ok(written)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(DbError::BulkLoadError {
                    table: table.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Attach the failing SQL to execution errors, keep missing-table errors as such.
fn classify(err: duckdb::Error, sql: &str) -> DbError {
    match DbError::from(err) {
        DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{msg}: {sql}")),
        other => other,
    }
}

/// Convert a bound parameter. Dates and timestamps travel as text and are
/// cast by the placeholder.
fn to_duck(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Bool(b) => DuckValue::Boolean(*b),
        Value::Int(n) => DuckValue::BigInt(*n),
        Value::Float(x) => DuckValue::Double(*x),
        Value::Text(s) => DuckValue::Text(s.clone()),
        Value::Date(_) | Value::Timestamp(_) => DuckValue::Text(value.to_string()),
    }
}

/// Types `from_duck` converts without loss.
fn reads_natively(data_type: &str) -> bool {
    is_null_type(data_type)
        || matches!(
            data_type,
            "BOOLEAN"
                | "TINYINT"
                | "SMALLINT"
                | "INTEGER"
                | "BIGINT"
                | "UTINYINT"
                | "USMALLINT"
                | "UINTEGER"
                | "FLOAT"
                | "DOUBLE"
                | "VARCHAR"
                | "DATE"
                | "TIMESTAMP"
                | "TIMESTAMP_S"
                | "TIMESTAMP_MS"
                | "TIMESTAMP_NS"
        )
}

/// The type of an untyped NULL literal; it cannot declare a table column.
fn is_null_type(data_type: &str) -> bool {
    data_type.trim_matches('"') == "NULL"
}

fn from_duck(value: DuckValue) -> DbResult<Value> {
    let converted = match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(n) => Value::Int(n.into()),
        DuckValue::SmallInt(n) => Value::Int(n.into()),
        DuckValue::Int(n) => Value::Int(n.into()),
        DuckValue::BigInt(n) => Value::Int(n),
        DuckValue::UTinyInt(n) => Value::Int(n.into()),
        DuckValue::USmallInt(n) => Value::Int(n.into()),
        DuckValue::UInt(n) => Value::Int(n.into()),
        DuckValue::Float(x) => Value::Float(x.into()),
        DuckValue::Double(x) => Value::Float(x),
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Date32(days) => {
            NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .map_or(Value::Null, Value::Date)
        }
        DuckValue::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map_or(Value::Null, |dt| Value::Timestamp(dt.naive_utc()))
        }
        other => {
            return Err(DbError::ExecutionError(format!(
                "no row value for DuckDB value {other:?}"
            )))
        }
    };
    Ok(converted)
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn describe(&self, name: &str) -> DbResult<Vec<ColumnInfo>> {
        self.describe_sync(name)
    }

    async fn query(&self, sql: &str) -> DbResult<RowSet> {
        self.query_sync(sql)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn bulk_load(&self, table: &str, rows: &RowSet, mode: LoadMode) -> DbResult<usize> {
        self.bulk_load_sync(table, rows, mode)
    }

    async fn load_csv(&self, table: &str, path: &str) -> DbResult<usize> {
        if !Path::new(path).is_file() {
            return Err(DbError::CsvError(format!("file not found: {path}")));
        }
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto({})",
            quote_qualified(table),
            quote_literal(path)
        );
        self.execute_sync(&sql)
            .map_err(|e| DbError::CsvError(e.to_string()))?;
        self.query_count_sync(&format!("SELECT * FROM {}", quote_qualified(table)))
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_qualified(schema));
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn drop_if_exists(&self, name: &str) -> DbResult<()> {
        let qualified = quote_qualified(name);
        // The catalog entry may be either kind; dropping the wrong kind errors.
        let _ = self.execute_sync(&format!("DROP VIEW IF EXISTS {qualified}"));
        let _ = self.execute_sync(&format!("DROP TABLE IF EXISTS {qualified}"));
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
