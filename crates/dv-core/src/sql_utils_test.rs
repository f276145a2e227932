use super::*;

#[test]
fn test_quote_ident_simple() {
    assert_eq!(quote_ident("valid_from"), r#""valid_from""#);
}

#[test]
fn test_quote_ident_with_embedded_quotes() {
    assert_eq!(quote_ident(r#"my"col"#), r#""my""col""#);
}

#[test]
fn test_quote_ident_keeps_dots() {
    assert_eq!(quote_ident("a.b"), r#""a.b""#);
}

#[test]
fn test_quote_qualified_two_parts() {
    assert_eq!(quote_qualified("landing.movies"), r#""landing"."movies""#);
}

#[test]
fn test_quote_qualified_three_parts() {
    assert_eq!(
        quote_qualified("warehouse.history.dim_movie"),
        r#""warehouse"."history"."dim_movie""#
    );
}

#[test]
fn test_split_qualified_name() {
    assert_eq!(split_qualified_name("movies"), ("main", "movies"));
    assert_eq!(split_qualified_name("landing.movies"), ("landing", "movies"));
    assert_eq!(split_qualified_name("db.landing.movies"), ("db.landing", "movies"));
}

#[test]
fn test_schema_of() {
    assert_eq!(schema_of("movies"), None);
    assert_eq!(schema_of("history.dim_movie"), Some("history"));
}

#[test]
fn test_quote_literal_escapes() {
    assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    assert_eq!(escape_sql_string("it's"), "it''s");
}
