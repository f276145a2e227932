//! Store-facing surrogate-key assignment
//!
//! The key table holds every batch ever annotated, so the same
//! (business key, surrogate key) pair appears once per stored version.
//! Prior assignments are read back as distinct pairs.

use crate::error::{ScdError, ScdResult};
use chrono::NaiveDate;
use dv_core::sql_utils::{quote_ident, quote_qualified};
use dv_core::{
    Clock, DimensionConfig, Operand, Predicate, Relation, RowSet, Select, SelectItem,
    SurrogateKeyConfig, SurrogateKeyMap,
};
use dv_db::{Database, LoadMode};
use log::info;

/// What one key assignment did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAssignmentOutcome {
    pub table: String,
    /// Rows annotated and appended to the key table
    pub rows: usize,
    /// Business keys that received a new surrogate key
    pub minted: usize,
    /// Rows that reused an existing surrogate key
    pub reused: usize,
    /// Highest surrogate key after this run
    pub max_key: i64,
}

/// Assigns stable surrogate keys and persists them in the key table
pub struct SurrogateKeyAssigner<'a> {
    db: &'a dyn Database,
    clock: &'a dyn Clock,
}

impl<'a> SurrogateKeyAssigner<'a> {
    pub fn new(db: &'a dyn Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Load prior (business key, surrogate key) pairs from the key table
    ///
    /// An absent key table is an empty mapping, so keys start at 1.
    pub async fn existing_keys(
        &self,
        keys: &SurrogateKeyConfig,
        business_key: &str,
    ) -> ScdResult<SurrogateKeyMap> {
        if !self.db.relation_exists(&keys.table).await? {
            return Ok(SurrogateKeyMap::new());
        }

        let present: Vec<String> = self
            .db
            .describe(&keys.table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        for required in [business_key, keys.column.as_str()] {
            if !present.iter().any(|c| c == required) {
                return Err(ScdError::KeyTableInvalid {
                    table: keys.table.clone(),
                    reason: format!("missing column '{}'", required),
                });
            }
        }

        let pairs = self
            .db
            .query(&format!(
                "SELECT DISTINCT {}, {} FROM {}",
                quote_ident(business_key),
                quote_ident(&keys.column),
                quote_qualified(&keys.table)
            ))
            .await?;

        Ok(SurrogateKeyMap::from_pairs(
            pairs
                .rows()
                .iter()
                .map(|row| (row[0].clone(), row[1].as_i64())),
        )?)
    }

    /// Annotate `batch` with surrogate keys and append it to the key table
    pub async fn assign(
        &self,
        keys: &SurrogateKeyConfig,
        business_key: &str,
        batch: &RowSet,
    ) -> ScdResult<KeyAssignmentOutcome> {
        let mut map = self.existing_keys(keys, business_key).await?;
        let assignment = map.assign(batch.column_values(business_key)?);

        let annotated = batch.with_column(
            &keys.column,
            assignment.keys.into_iter().map(Into::into).collect(),
        )?;

        let rows = if annotated.is_empty() {
            0
        } else {
            self.db
                .bulk_load(&keys.table, &annotated, LoadMode::Append)
                .await?
        };

        info!(
            "{}: {} new surrogate keys, {} reused (max {})",
            keys.table,
            assignment.minted,
            assignment.reused,
            map.max_key()
        );

        Ok(KeyAssignmentOutcome {
            table: keys.table.clone(),
            rows,
            minted: assignment.minted,
            reused: assignment.reused,
            max_key: map.max_key(),
        })
    }

    /// Assign keys to the versions this dimension opened today
    ///
    /// Returns `None` when the dimension has no surrogate key configured.
    pub async fn assign_opened_today(
        &self,
        dimension: &DimensionConfig,
    ) -> ScdResult<Option<KeyAssignmentOutcome>> {
        let Some(keys) = &dimension.surrogate_key else {
            return Ok(None);
        };
        let select = opened_on_select(dimension, self.clock.today());
        let batch = self.db.query(&select.to_string()).await?;
        let outcome = self
            .assign(keys, &dimension.business_key, &batch)
            .await?;
        Ok(Some(outcome))
    }
}

/// Current versions of a dimension whose validity starts on `day`.
pub fn opened_on_select(dimension: &DimensionConfig, day: NaiveDate) -> Select {
    let meta = &dimension.metadata;
    Select {
        items: vec![SelectItem::AllFrom("t".to_string())],
        from: Relation::new(&dimension.target, "t"),
        join: None,
        filter: Some(Predicate::And(vec![
            Predicate::eq(Operand::col("t", &meta.is_current), Operand::lit(true)),
            Predicate::eq(Operand::col("t", &meta.valid_from), Operand::lit(day)),
        ])),
    }
}

#[cfg(test)]
#[path = "keys_test.rs"]
mod tests;
