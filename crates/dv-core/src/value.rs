//! In-memory row model shared by the store, the quality checks and the
//! surrogate-key allocator.

use crate::error::{CoreError, CoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text form used for identity comparisons.
    ///
    /// NULL maps to `None`, so it never collides with an empty string.
    pub fn canonical(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Integer view of the value, if it holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// DuckDB column type that can hold this value. NULL has no type.
    pub fn sql_type(&self) -> Option<&'static str> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some("BOOLEAN"),
            Value::Int(_) => Some("BIGINT"),
            Value::Float(_) => Some("DOUBLE"),
            Value::Text(_) => Some("VARCHAR"),
            Value::Date(_) => Some("DATE"),
            Value::Timestamp(_) => Some("TIMESTAMP"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A named-column table held in memory.
///
/// Columns read from the store carry the store's declared type, so a row set
/// written back recreates the same column types.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(skip)]
    declared_types: Vec<Option<String>>,
}

impl RowSet {
    /// Empty row set with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            declared_types: vec![None; columns.len()],
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a row set, checking every row against the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> CoreResult<Self> {
        let mut set = Self::new(columns);
        for row in rows {
            set.push(row)?;
        }
        Ok(set)
    }

    /// Append a row.
    pub fn push(&mut self, row: Vec<Value>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidthMismatch {
                index: self.rows.len(),
                found: row.len(),
                expected: self.columns.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Attach declared column types, one per column.
    pub fn with_declared_types(mut self, types: Vec<Option<String>>) -> CoreResult<Self> {
        if types.len() != self.columns.len() {
            return Err(CoreError::RowWidthMismatch {
                index: 0,
                found: types.len(),
                expected: self.columns.len(),
            });
        }
        self.declared_types = types;
        Ok(self)
    }

    pub fn declared_type(&self, idx: usize) -> Option<&str> {
        self.declared_types.get(idx).and_then(|t| t.as_deref())
    }

    /// Column type for table creation: the declared type when there is one.
    pub fn column_type(&self, idx: usize) -> &str {
        self.declared_type(idx)
            .unwrap_or_else(|| self.inferred_type(idx))
    }

    /// Position of a column, matched exactly by name.
    pub fn column_index(&self, name: &str) -> CoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CoreError::ColumnNotFound {
                column: name.to_string(),
                available: self.columns.join(", "),
            })
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, name: &str) -> CoreResult<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Return a copy with one extra column appended.
    pub fn with_column(&self, name: &str, values: Vec<Value>) -> CoreResult<Self> {
        if values.len() != self.rows.len() {
            return Err(CoreError::RowWidthMismatch {
                index: 0,
                found: values.len(),
                expected: self.rows.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let mut declared_types = self.declared_types.clone();
        declared_types.push(None);
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();
        Ok(Self {
            columns,
            rows,
            declared_types,
        })
    }

    /// Column type for table creation: the type of the first non-null value,
    /// widened to DOUBLE for int/float mixes and to VARCHAR otherwise.
    pub fn inferred_type(&self, idx: usize) -> &'static str {
        let mut inferred: Option<&'static str> = None;
        for row in &self.rows {
            let Some(ty) = row[idx].sql_type() else {
                continue;
            };
            inferred = match inferred {
                None => Some(ty),
                Some(prev) if prev == ty => Some(prev),
                Some("BIGINT") | Some("DOUBLE") if ty == "BIGINT" || ty == "DOUBLE" => {
                    Some("DOUBLE")
                }
                Some(_) => return "VARCHAR",
            };
        }
        inferred.unwrap_or("VARCHAR")
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
