//! Content fingerprints for change detection
//!
//! A fingerprint covers the content columns of a row only; the business key
//! and the validity metadata never participate. Each column contributes
//! `length(v) || ':' || v`, where `v` is the value cast to text with NULL
//! replaced by the empty string, so two different column splits can never
//! concatenate to the same input. The concatenation is hashed with `md5`.

use crate::relation::ColumnRef;
use std::fmt;

/// Fingerprint expression over one relation alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    alias: String,
    columns: Vec<String>,
}

impl Fingerprint {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "md5('')");
        }
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|name| {
                let col = ColumnRef {
                    alias: Some(self.alias.clone()),
                    name: name.clone(),
                };
                let text = format!("COALESCE(CAST({col} AS VARCHAR), '')");
                format!("CAST(length({text}) AS VARCHAR) || ':' || {text}")
            })
            .collect();
        write!(f, "md5({})", parts.join(" || "))
    }
}

/// Builds fingerprints for both sides of a merge from one column order.
///
/// Source and target fingerprints of a run must come from the same hasher;
/// a different column order on either side would flag every row as changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeHasher {
    content_columns: Vec<String>,
}

impl ChangeHasher {
    /// Use `content_columns` in the given order.
    pub fn new(content_columns: Vec<String>) -> Self {
        Self { content_columns }
    }

    /// Derive content columns from a source column list, dropping the
    /// business key and any excluded (metadata) columns.
    pub fn from_source_columns(
        source_columns: &[String],
        business_key: &str,
        excluded: &[&str],
    ) -> Self {
        let content_columns = source_columns
            .iter()
            .filter(|c| c.as_str() != business_key && !excluded.contains(&c.as_str()))
            .cloned()
            .collect();
        Self { content_columns }
    }

    pub fn content_columns(&self) -> &[String] {
        &self.content_columns
    }

    /// Fingerprint expression for rows of the relation bound to `alias`.
    pub fn fingerprint(&self, alias: &str) -> Fingerprint {
        Fingerprint {
            alias: alias.to_string(),
            columns: self.content_columns.clone(),
        }
    }
}
