//! SCD Type 2 merge of a source snapshot into a history table
//!
//! Incremental runs are two statements, always in this order:
//!
//! 1. close: current history rows whose fingerprint differs from the source
//!    row with the same business key get `valid_to = yesterday` and
//!    `is_current = FALSE`.
//! 2. open: source rows with no current history row (new keys, and keys
//!    closed by step 1) are inserted with `valid_from = today`.
//!
//! Unchanged keys are never written. When the history table is absent it is
//! created from the full snapshot instead.

use crate::error::{ScdError, ScdResult};
use chrono::NaiveDate;
use dv_core::sql_utils::{quote_qualified, schema_of};
use dv_core::{
    ChangeHasher, Clock, CoreError, DimensionConfig, Join, JoinKind, Operand, Predicate,
    Relation, Select, SelectItem, Statement,
};
use dv_db::Database;
use log::info;
use std::fmt;

const SOURCE_ALIAS: &str = "s";
const TARGET_ALIAS: &str = "t";

/// Lifecycle of a history table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionState {
    /// History table does not exist yet; the next merge bootstraps it
    Uninitialized,
    /// History table exists; merges close and open versions
    Active,
}

impl fmt::Display for DimensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionState::Uninitialized => write!(f, "uninitialized"),
            DimensionState::Active => write!(f, "active"),
        }
    }
}

/// What one merge did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub state_before: DimensionState,
    pub bootstrapped: bool,
    /// Current versions closed by this run
    pub closed: usize,
    /// Versions inserted by this run (every row on bootstrap)
    pub opened: usize,
    /// Columns covered by the fingerprint, in hashing order
    pub content_columns: Vec<String>,
}

/// Runs the SCD2 merge for one dimension at a time
pub struct Scd2Merger<'a> {
    db: &'a dyn Database,
    clock: &'a dyn Clock,
}

impl<'a> Scd2Merger<'a> {
    pub fn new(db: &'a dyn Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Probe whether the history table exists
    pub async fn state(&self, dimension: &DimensionConfig) -> ScdResult<DimensionState> {
        if self.db.relation_exists(&dimension.target).await? {
            Ok(DimensionState::Active)
        } else {
            Ok(DimensionState::Uninitialized)
        }
    }

    /// Merge the dimension's source snapshot into its history table
    pub async fn merge(&self, dimension: &DimensionConfig) -> ScdResult<MergeOutcome> {
        if let Some(schema) = schema_of(&dimension.target) {
            self.db.create_schema_if_not_exists(schema).await?;
        }

        let hasher = self.source_hasher(dimension).await?;
        let state_before = self.state(dimension).await?;
        let today = self.clock.today();

        match state_before {
            DimensionState::Uninitialized => {
                info!(
                    "{}: bootstrapping {} from {}",
                    dimension.name, dimension.target, dimension.source
                );
                self.db
                    .run(&bootstrap_statement(dimension, &hasher, today))
                    .await?;
                let opened = self
                    .db
                    .query_count(&format!(
                        "SELECT 1 FROM {}",
                        quote_qualified(&dimension.target)
                    ))
                    .await?;
                Ok(MergeOutcome {
                    state_before,
                    bootstrapped: true,
                    closed: 0,
                    opened,
                    content_columns: hasher.content_columns().to_vec(),
                })
            }
            DimensionState::Active => {
                self.check_target_columns(dimension, &hasher).await?;

                let closed = self
                    .db
                    .run(&close_changed_statement(
                        dimension,
                        &hasher,
                        self.clock.yesterday(),
                    ))
                    .await?;
                info!("{}: closed {} changed versions", dimension.name, closed);

                let opened = self
                    .db
                    .run(&open_versions_statement(dimension, &hasher, today))
                    .await?;
                info!("{}: opened {} new versions", dimension.name, opened);

                Ok(MergeOutcome {
                    state_before,
                    bootstrapped: false,
                    closed,
                    opened,
                    content_columns: hasher.content_columns().to_vec(),
                })
            }
        }
    }

    async fn source_hasher(&self, dimension: &DimensionConfig) -> ScdResult<ChangeHasher> {
        let columns: Vec<String> = self
            .db
            .describe(&dimension.source)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        if !columns.contains(&dimension.business_key) {
            return Err(CoreError::ColumnNotFound {
                column: dimension.business_key.clone(),
                available: columns.join(", "),
            }
            .into());
        }

        Ok(ChangeHasher::from_source_columns(
            &columns,
            &dimension.business_key,
            &dimension.metadata.names(),
        ))
    }

    /// The history table must hold the key, every content column and the
    /// metadata columns before anything is written.
    async fn check_target_columns(
        &self,
        dimension: &DimensionConfig,
        hasher: &ChangeHasher,
    ) -> ScdResult<()> {
        let present: Vec<String> = self
            .db
            .describe(&dimension.target)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let missing: Vec<String> = std::iter::once(dimension.business_key.as_str())
            .chain(hasher.content_columns().iter().map(String::as_str))
            .chain(dimension.metadata.names())
            .filter(|name| !present.iter().any(|p| p == name))
            .map(String::from)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScdError::SchemaMismatch {
                target: dimension.target.clone(),
                missing,
            })
        }
    }
}

fn key_match(dimension: &DimensionConfig) -> Predicate {
    Predicate::eq(
        Operand::col(SOURCE_ALIAS, &dimension.business_key),
        Operand::col(TARGET_ALIAS, &dimension.business_key),
    )
}

fn target_is_current(dimension: &DimensionConfig) -> Predicate {
    Predicate::eq(
        Operand::col(TARGET_ALIAS, &dimension.metadata.is_current),
        Operand::lit(true),
    )
}

/// Source projection shared by bootstrap and open: key, content columns,
/// then the metadata of a fresh current version.
fn new_version_items(
    dimension: &DimensionConfig,
    hasher: &ChangeHasher,
    today: NaiveDate,
) -> Vec<SelectItem> {
    let meta = &dimension.metadata;
    std::iter::once(&dimension.business_key)
        .chain(hasher.content_columns())
        .map(|name| SelectItem::named(Operand::col(SOURCE_ALIAS, name), name))
        .chain([
            SelectItem::named(Operand::lit(today), &meta.valid_from),
            SelectItem::named(Operand::TypedNull("DATE"), &meta.valid_to),
            SelectItem::named(Operand::lit(true), &meta.is_current),
        ])
        .collect()
}

/// Create the history table with one current version per source row.
pub fn bootstrap_statement(
    dimension: &DimensionConfig,
    hasher: &ChangeHasher,
    today: NaiveDate,
) -> Statement {
    Statement::CreateTableAs {
        table: dimension.target.clone(),
        select: Select {
            items: new_version_items(dimension, hasher, today),
            from: Relation::new(&dimension.source, SOURCE_ALIAS),
            join: None,
            filter: None,
        },
    }
}

/// Close current versions whose content differs from the source row.
pub fn close_changed_statement(
    dimension: &DimensionConfig,
    hasher: &ChangeHasher,
    yesterday: NaiveDate,
) -> Statement {
    let meta = &dimension.metadata;
    let changed_keys = Select {
        items: vec![SelectItem::expr(Operand::col(
            SOURCE_ALIAS,
            &dimension.business_key,
        ))],
        from: Relation::new(&dimension.source, SOURCE_ALIAS),
        join: Some(Join {
            kind: JoinKind::Inner,
            relation: Relation::new(&dimension.target, TARGET_ALIAS),
            on: Predicate::And(vec![key_match(dimension), target_is_current(dimension)]),
        }),
        filter: Some(Predicate::not_eq(
            Operand::Fingerprint(hasher.fingerprint(SOURCE_ALIAS)),
            Operand::Fingerprint(hasher.fingerprint(TARGET_ALIAS)),
        )),
    };

    Statement::Update {
        table: dimension.target.clone(),
        assignments: vec![
            (meta.valid_to.clone(), Operand::lit(yesterday)),
            (meta.is_current.clone(), Operand::lit(false)),
        ],
        filter: Predicate::And(vec![
            Predicate::eq(Operand::bare(&meta.is_current), Operand::lit(true)),
            Predicate::In {
                operand: Operand::bare(&dimension.business_key),
                select: Box::new(changed_keys),
            },
        ]),
    }
}

/// Insert a current version for every source row without one.
///
/// Columns are listed by name so the physical column order of the source
/// and history tables never matters.
pub fn open_versions_statement(
    dimension: &DimensionConfig,
    hasher: &ChangeHasher,
    today: NaiveDate,
) -> Statement {
    let meta = &dimension.metadata;
    let columns: Vec<String> = std::iter::once(&dimension.business_key)
        .chain(hasher.content_columns())
        .cloned()
        .chain(meta.names().map(String::from))
        .collect();

    Statement::InsertSelect {
        table: dimension.target.clone(),
        columns,
        select: Select {
            items: new_version_items(dimension, hasher, today),
            from: Relation::new(&dimension.source, SOURCE_ALIAS),
            join: Some(Join {
                kind: JoinKind::Left,
                relation: Relation::new(&dimension.target, TARGET_ALIAS),
                on: Predicate::And(vec![key_match(dimension), target_is_current(dimension)]),
            }),
            filter: Some(Predicate::IsNull(Operand::col(
                TARGET_ALIAS,
                &dimension.business_key,
            ))),
        },
    }
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
