use super::*;
use dv_core::{DimensionQuality, MetadataColumns};

fn dimension() -> DimensionConfig {
    DimensionConfig {
        name: "dim_movie".to_string(),
        source: "landing.movies".to_string(),
        target: "history.dim_movie".to_string(),
        business_key: "movie_id".to_string(),
        metadata: MetadataColumns::default(),
        surrogate_key: None,
        quality: DimensionQuality::default(),
        description: None,
    }
}

fn hasher() -> ChangeHasher {
    ChangeHasher::new(vec!["title".to_string(), "year".to_string()])
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[test]
fn test_close_statement_shape() {
    let sql = close_changed_statement(&dimension(), &hasher(), day(9)).to_string();
    assert!(sql.starts_with(r#"UPDATE "history"."dim_movie" SET "valid_to" = DATE '2024-03-09', "is_current" = FALSE WHERE"#));
    assert!(sql.contains(r#"("is_current" = TRUE)"#));
    assert!(sql.contains(r#""movie_id" IN (SELECT "s"."movie_id" FROM "landing"."movies" AS "s" INNER JOIN "history"."dim_movie" AS "t""#));
    assert!(sql.contains(r#"("t"."is_current" = TRUE)"#));
    assert!(sql.contains(" <> md5("));
}

#[test]
fn test_open_statement_lists_columns_by_name() {
    let sql = open_versions_statement(&dimension(), &hasher(), day(10)).to_string();
    assert!(sql.starts_with(
        r#"INSERT INTO "history"."dim_movie" ("movie_id", "title", "year", "valid_from", "valid_to", "is_current") SELECT"#
    ));
    assert!(sql.contains(r#""s"."title" AS "title""#));
    assert!(sql.contains(r#"DATE '2024-03-10' AS "valid_from""#));
    assert!(sql.contains(r#"CAST(NULL AS DATE) AS "valid_to""#));
    assert!(sql.contains(r#"LEFT JOIN "history"."dim_movie" AS "t""#));
    assert!(sql.ends_with(r#"WHERE "t"."movie_id" IS NULL"#));
}

#[test]
fn test_bootstrap_statement_projects_key_content_and_metadata() {
    let sql = bootstrap_statement(&dimension(), &hasher(), day(10)).to_string();
    assert_eq!(
        sql,
        r#"CREATE TABLE "history"."dim_movie" AS SELECT "s"."movie_id" AS "movie_id", "s"."title" AS "title", "s"."year" AS "year", DATE '2024-03-10' AS "valid_from", CAST(NULL AS DATE) AS "valid_to", TRUE AS "is_current" FROM "landing"."movies" AS "s""#
    );
}

#[test]
fn test_custom_metadata_names_flow_into_statements() {
    let mut dim = dimension();
    dim.metadata = MetadataColumns {
        valid_from: "eff_start".to_string(),
        valid_to: "eff_end".to_string(),
        is_current: "active".to_string(),
    };
    let close = close_changed_statement(&dim, &hasher(), day(9)).to_string();
    assert!(close.contains(r#""eff_end" = DATE '2024-03-09'"#));
    assert!(close.contains(r#""active" = FALSE"#));

    let open = open_versions_statement(&dim, &hasher(), day(10)).to_string();
    assert!(open.contains(r#""eff_start", "eff_end", "active")"#));
}

#[test]
fn test_state_display() {
    assert_eq!(DimensionState::Uninitialized.to_string(), "uninitialized");
    assert_eq!(DimensionState::Active.to_string(), "active");
}
