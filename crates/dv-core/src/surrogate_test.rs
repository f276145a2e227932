use super::*;

fn bk(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn test_empty_mapping_starts_at_one() {
    let mut map = SurrogateKeyMap::new();
    let batch = bk(&["b", "a", "c"]);
    let assignment = map.assign(&batch);
    assert_eq!(assignment.keys, vec![1, 2, 3]);
    assert_eq!(assignment.minted, 3);
    assert_eq!(assignment.reused, 0);
}

#[test]
fn test_existing_keys_reused_and_new_keys_follow_max() {
    let mut map = SurrogateKeyMap::from_pairs(vec![
        (Value::from("a"), Some(1)),
        (Value::from("b"), Some(7)),
    ])
    .unwrap();
    assert_eq!(map.max_key(), 7);

    let batch = bk(&["z", "b", "y", "a"]);
    let assignment = map.assign(&batch);
    assert_eq!(assignment.keys, vec![8, 7, 9, 1]);
    assert_eq!(assignment.minted, 2);
    assert_eq!(assignment.reused, 2);
}

#[test]
fn test_all_null_mapping_treated_as_zero() {
    let mut map = SurrogateKeyMap::from_pairs(vec![
        (Value::from("a"), None),
        (Value::from("b"), None),
    ])
    .unwrap();
    assert_eq!(map.max_key(), 0);
    assert!(map.is_empty());
    let batch = bk(&["a"]);
    assert_eq!(map.assign(&batch).keys, vec![1]);
}

#[test]
fn test_repeated_key_in_batch_shares_one_key() {
    let mut map = SurrogateKeyMap::new();
    let batch = bk(&["x", "x", "y"]);
    let assignment = map.assign(&batch);
    assert_eq!(assignment.keys, vec![1, 1, 2]);
    assert_eq!(assignment.minted, 2);
}

#[test]
fn test_duplicate_identical_pairs_accepted() {
    let map = SurrogateKeyMap::from_pairs(vec![
        (Value::from("a"), Some(3)),
        (Value::from("a"), Some(3)),
    ])
    .unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&Value::from("a")), Some(3));
}

#[test]
fn test_conflicting_pairs_rejected() {
    let err = SurrogateKeyMap::from_pairs(vec![
        (Value::from("a"), Some(3)),
        (Value::from("a"), Some(4)),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        CoreError::SurrogateKeyConflict {
            first: 3,
            second: 4,
            ..
        }
    ));
}

#[test]
fn test_new_keys_strictly_greater_than_previous() {
    let mut map = SurrogateKeyMap::from_pairs(vec![(Value::from("a"), Some(41))]).unwrap();
    let first = map.assign(&bk(&["b", "c"]));
    let second = map.assign(&bk(&["d", "a"]));
    assert!(first.keys.iter().all(|k| *k > 41));
    assert_eq!(second.keys, vec![44, 41]);
}

#[test]
fn test_integer_business_keys_use_text_identity() {
    let mut map = SurrogateKeyMap::from_pairs(vec![(Value::from("10"), Some(5))]).unwrap();
    let batch = vec![Value::Int(10), Value::Int(11)];
    assert_eq!(map.assign(&batch).keys, vec![5, 6]);
}

#[test]
fn test_null_business_key_is_not_the_text_null() {
    let mut map = SurrogateKeyMap::new();
    let batch = vec![Value::Null, Value::from("NULL"), Value::Null];
    let assignment = map.assign(&batch);
    assert_eq!(assignment.keys, vec![1, 2, 1]);
    assert_eq!(assignment.minted, 2);
    assert_eq!(map.get(&Value::Null), Some(1));
    assert_eq!(map.get(&Value::from("NULL")), Some(2));
}

#[test]
fn test_persisted_null_key_stays_apart_from_text_null() {
    let mut map = SurrogateKeyMap::from_pairs(vec![(Value::Null, Some(4))]).unwrap();
    let batch = vec![Value::from("NULL"), Value::Null];
    assert_eq!(map.assign(&batch).keys, vec![5, 4]);
}
