use super::*;
use crate::value::Value;

fn set(columns: &[&str], rows: Vec<Vec<Value>>) -> RowSet {
    RowSet::from_rows(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

fn ids(n: i64) -> RowSet {
    set(&["id"], (1..=n).map(|i| vec![Value::Int(i)]).collect())
}

#[test]
fn test_row_count_match_pass() {
    let outcome = row_count_match_sets(&ids(10), &ids(10));
    assert_eq!(outcome.status, CheckStatus::Pass);
    assert_eq!(outcome.actual_1, 10.0);
    assert_eq!(outcome.actual_2, Some(10.0));
    assert_eq!(outcome.threshold, 0.0);
    assert_eq!(outcome.message, "Counts match (10)");
}

#[test]
fn test_row_count_match_fail() {
    let outcome = row_count_match_sets(&ids(10), &ids(9));
    assert_eq!(outcome.status, CheckStatus::Fail);
    assert_eq!(outcome.actual_1, 10.0);
    assert_eq!(outcome.actual_2, Some(9.0));
    assert_eq!(outcome.message, "Mismatch: Source has 10, Target has 9");
}

#[test]
fn test_duplicate_keys_counts_repeats_beyond_first() {
    let data = set(
        &["id"],
        vec![vec![Value::Int(1)], vec![Value::Int(1)], vec![Value::Int(2)]],
    );
    let outcome = duplicate_keys(&data, &["id".to_string()]).unwrap();
    assert_eq!(outcome.status, CheckStatus::Fail);
    assert_eq!(outcome.actual_1, 1.0);
    assert_eq!(outcome.actual_2, None);
    assert_eq!(outcome.message, "Found 1 duplicate keys on [id]");
}

#[test]
fn test_duplicate_keys_pass() {
    let outcome = duplicate_keys(&ids(3), &["id".to_string()]).unwrap();
    assert!(outcome.passed());
    assert_eq!(outcome.message, "Unique keys confirmed on [id]");
}

#[test]
fn test_duplicate_keys_unknown_column() {
    assert!(duplicate_keys(&ids(3), &["movie_id".to_string()]).is_err());
}

#[test]
fn test_duplicate_keys_ignores_other_columns() {
    let data = set(
        &["id", "name"],
        vec![
            vec![Value::Int(1), Value::from("A")],
            vec![Value::Int(1), Value::from("B")],
            vec![Value::Int(1), Value::from("C")],
        ],
    );
    let outcome = duplicate_keys(&data, &["id".to_string()]).unwrap();
    assert_eq!(outcome.actual_1, 2.0);
}

#[test]
fn test_duplicate_rows_requires_every_column() {
    let data = set(
        &["id", "name"],
        vec![
            vec![Value::Int(1), Value::from("A")],
            vec![Value::Int(1), Value::from("B")],
            vec![Value::Int(1), Value::from("A")],
        ],
    );
    let outcome = duplicate_rows(&data);
    assert_eq!(outcome.status, CheckStatus::Fail);
    assert_eq!(outcome.actual_1, 1.0);
    assert_eq!(outcome.kind.log_name(), "Duplicate Row Check");
}

#[test]
fn test_duplicate_rows_null_vs_empty() {
    let data = set(
        &["name"],
        vec![vec![Value::Null], vec![Value::from("")], vec![Value::Null]],
    );
    assert_eq!(duplicate_rows(&data).actual_1, 1.0);
}

#[test]
fn test_duplicate_rows_empty_dataset_passes() {
    let outcome = duplicate_rows(&set(&["id"], Vec::new()));
    assert!(outcome.passed());
    assert_eq!(outcome.message, "No duplicate rows found");
}
