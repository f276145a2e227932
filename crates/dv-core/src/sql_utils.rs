//! Identifier and literal quoting for generated SQL
//!
//! Every table, column, and string literal that reaches the store passes
//! through these helpers, so names taken from YAML config cannot break out
//! of the statement they are placed in.

/// Quote a single SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use dv_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("movie_id"), r#""movie_id""#);
/// assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a dotted relation name (`schema.table`) part by part.
///
/// # Examples
/// ```
/// use dv_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("history.dim_movie"), r#""history"."dim_movie""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a relation name into `(schema, table)`, defaulting the schema to `main`.
///
/// # Examples
/// ```
/// use dv_core::sql_utils::split_qualified_name;
/// assert_eq!(split_qualified_name("dim_movie"), ("main", "dim_movie"));
/// assert_eq!(split_qualified_name("history.dim_movie"), ("history", "dim_movie"));
/// ```
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Schema part of a relation name, if the name is qualified.
pub fn schema_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[..pos])
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
