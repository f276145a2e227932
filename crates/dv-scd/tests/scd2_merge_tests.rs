//! End-to-end SCD2 merge scenarios against in-memory DuckDB

use chrono::NaiveDate;
use dv_core::{DimensionConfig, DimensionQuality, FixedClock, MetadataColumns, Value};
use dv_db::{Database, DbError, DuckDbBackend};
use dv_scd::{DimensionState, ScdError, Scd2Merger};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn dimension() -> DimensionConfig {
    DimensionConfig {
        name: "dim_person".to_string(),
        source: "landing.people".to_string(),
        target: "history.dim_person".to_string(),
        business_key: "id".to_string(),
        metadata: MetadataColumns::default(),
        surrogate_key: None,
        quality: DimensionQuality::default(),
        description: None,
    }
}

async fn setup(source_sql: &str) -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE SCHEMA landing").await.unwrap();
    replace_source(&db, source_sql).await;
    db
}

async fn replace_source(db: &DuckDbBackend, select: &str) {
    db.execute_batch(&format!(
        "CREATE OR REPLACE TABLE landing.people AS {select}"
    ))
    .await
    .unwrap();
}

async fn merge_on(db: &DuckDbBackend, day: u32) -> dv_scd::MergeOutcome {
    let clock = FixedClock::new(date(day));
    Scd2Merger::new(db, &clock)
        .merge(&dimension())
        .await
        .unwrap()
}

/// (id, name, valid_from, valid_to, is_current) ordered by id, valid_from
async fn history(db: &DuckDbBackend) -> Vec<Vec<Value>> {
    db.query(
        "SELECT id, name, valid_from, valid_to, is_current FROM history.dim_person ORDER BY id, valid_from",
    )
    .await
    .unwrap()
    .rows()
    .to_vec()
}

#[tokio::test]
async fn test_bootstrap_creates_current_rows() {
    let db = setup("SELECT 1 AS id, 'A' AS name").await;

    let outcome = merge_on(&db, 10).await;
    assert_eq!(outcome.state_before, DimensionState::Uninitialized);
    assert!(outcome.bootstrapped);
    assert_eq!(outcome.opened, 1);
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.content_columns, vec!["name".to_string()]);

    assert_eq!(
        history(&db).await,
        vec![vec![
            Value::Int(1),
            Value::from("A"),
            Value::Date(date(10)),
            Value::Null,
            Value::Bool(true),
        ]]
    );
}

#[tokio::test]
async fn test_changed_row_is_closed_and_reopened() {
    let db = setup("SELECT 1 AS id, 'A' AS name").await;
    merge_on(&db, 10).await;

    replace_source(&db, "SELECT 1 AS id, 'B' AS name").await;
    let outcome = merge_on(&db, 12).await;
    assert_eq!(outcome.state_before, DimensionState::Active);
    assert_eq!(outcome.closed, 1);
    assert_eq!(outcome.opened, 1);

    assert_eq!(
        history(&db).await,
        vec![
            vec![
                Value::Int(1),
                Value::from("A"),
                Value::Date(date(10)),
                Value::Date(date(11)),
                Value::Bool(false),
            ],
            vec![
                Value::Int(1),
                Value::from("B"),
                Value::Date(date(12)),
                Value::Null,
                Value::Bool(true),
            ],
        ]
    );
}

#[tokio::test]
async fn test_unchanged_row_is_untouched() {
    let db = setup("SELECT 1 AS id, 'A' AS name").await;
    merge_on(&db, 10).await;
    let before = history(&db).await;

    let outcome = merge_on(&db, 12).await;
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.opened, 0);
    assert_eq!(history(&db).await, before);
}

#[tokio::test]
async fn test_new_key_is_opened_and_missing_key_stays_current() {
    let db = setup("SELECT * FROM (VALUES (1, 'A'), (2, 'B')) v(id, name)").await;
    merge_on(&db, 10).await;

    replace_source(&db, "SELECT * FROM (VALUES (1, 'A'), (3, 'C')) v(id, name)").await;
    let outcome = merge_on(&db, 11).await;
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.opened, 1);

    let current = db
        .query("SELECT id FROM history.dim_person WHERE is_current ORDER BY id")
        .await
        .unwrap();
    let ids: Vec<i64> = current
        .rows()
        .iter()
        .map(|r| r[0].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_at_most_one_current_row_per_key_over_many_runs() {
    let db = setup("SELECT 1 AS id, 'v0' AS name").await;
    merge_on(&db, 1).await;
    for day in 2..8 {
        replace_source(
            &db,
            &format!("SELECT * FROM (VALUES (1, 'v{day}'), ({day}, 'x')) v(id, name)"),
        )
        .await;
        merge_on(&db, day).await;
    }

    let violations = db
        .query_count(
            "SELECT id FROM history.dim_person WHERE is_current GROUP BY id HAVING count(*) > 1",
        )
        .await
        .unwrap();
    assert_eq!(violations, 0);

    // valid_to is null exactly when the row is current
    let inconsistent = db
        .query_count(
            "SELECT 1 FROM history.dim_person WHERE (valid_to IS NULL) <> is_current",
        )
        .await
        .unwrap();
    assert_eq!(inconsistent, 0);

    let versions_of_one = db
        .query_count("SELECT 1 FROM history.dim_person WHERE id = 1")
        .await
        .unwrap();
    assert_eq!(versions_of_one, 7);
}

#[tokio::test]
async fn test_closed_rows_never_change() {
    let db = setup("SELECT 1 AS id, 'A' AS name").await;
    merge_on(&db, 10).await;
    replace_source(&db, "SELECT 1 AS id, 'B' AS name").await;
    merge_on(&db, 11).await;

    let closed_sql = "SELECT id, name, valid_from, valid_to FROM history.dim_person WHERE NOT is_current ORDER BY valid_from";
    let closed_before = db.query(closed_sql).await.unwrap();

    replace_source(&db, "SELECT 1 AS id, 'C' AS name").await;
    merge_on(&db, 12).await;
    let closed_after = db.query(closed_sql).await.unwrap();

    assert_eq!(closed_after.len(), 2);
    assert_eq!(closed_after.rows()[0], closed_before.rows()[0]);
}

#[tokio::test]
async fn test_column_order_mismatch_matches_by_name() {
    let db = setup("SELECT 1 AS id, 'A' AS name, 'red' AS colour").await;
    merge_on(&db, 10).await;

    // Same content, columns reordered in the new snapshot
    replace_source(&db, "SELECT 'red' AS colour, 'A' AS name, 1 AS id").await;
    let outcome = merge_on(&db, 11).await;
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.opened, 0);

    // A real change lands in the right columns
    replace_source(&db, "SELECT 'blue' AS colour, 'A' AS name, 1 AS id").await;
    merge_on(&db, 12).await;
    let current = db
        .query("SELECT name, colour FROM history.dim_person WHERE is_current")
        .await
        .unwrap();
    assert_eq!(
        current.rows()[0],
        vec![Value::from("A"), Value::from("blue")]
    );
}

#[tokio::test]
async fn test_shifted_column_boundary_is_a_change() {
    let db = setup("SELECT 1 AS id, 'ab' AS first, 'c' AS second").await;
    merge_on(&db, 10).await;

    replace_source(&db, "SELECT 1 AS id, 'a' AS first, 'bc' AS second").await;
    let outcome = merge_on(&db, 11).await;
    assert_eq!(outcome.closed, 1);
    assert_eq!(outcome.opened, 1);
}

#[tokio::test]
async fn test_null_and_empty_string_fingerprint_alike() {
    let db = setup("SELECT 1 AS id, CAST(NULL AS VARCHAR) AS name").await;
    merge_on(&db, 10).await;

    replace_source(&db, "SELECT 1 AS id, '' AS name").await;
    let outcome = merge_on(&db, 11).await;
    assert_eq!(outcome.closed, 0);
    assert_eq!(outcome.opened, 0);
}

#[tokio::test]
async fn test_target_missing_content_column_fails_before_writing() {
    let db = setup("SELECT 1 AS id, 'A' AS name").await;
    merge_on(&db, 10).await;
    let before = history(&db).await;

    replace_source(&db, "SELECT 1 AS id, 'B' AS name, 5 AS rating").await;
    let clock = FixedClock::new(date(11));
    let err = Scd2Merger::new(&db, &clock)
        .merge(&dimension())
        .await
        .unwrap_err();
    match err {
        ScdError::SchemaMismatch { missing, .. } => assert_eq!(missing, vec!["rating"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(history(&db).await, before);
}

#[tokio::test]
async fn test_missing_source_is_not_found() {
    let db = DuckDbBackend::in_memory().unwrap();
    let clock = FixedClock::new(date(10));
    let err = Scd2Merger::new(&db, &clock)
        .merge(&dimension())
        .await
        .unwrap_err();
    assert!(matches!(err, ScdError::Db(DbError::TableNotFound(_))));
}

#[tokio::test]
async fn test_missing_business_key_is_rejected() {
    let db = setup("SELECT 1 AS person_id, 'A' AS name").await;
    let clock = FixedClock::new(date(10));
    let err = Scd2Merger::new(&db, &clock)
        .merge(&dimension())
        .await
        .unwrap_err();
    assert!(matches!(err, ScdError::Core(_)));
    assert!(!db.relation_exists("history.dim_person").await.unwrap());
}
