//! Relational algebra for the SCD2 statements
//!
//! The merge is expressed as keyed joins, anti-joins and filtered updates
//! over named relations. [`Statement`] renders to SQL through `Display`; a
//! store backend may render it differently.

use crate::fingerprint::Fingerprint;
use crate::sql_utils::{quote_ident, quote_literal, quote_qualified};
use crate::value::Value;
use std::fmt;

/// A column, optionally qualified by a relation alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub alias: Option<String>,
    pub name: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{}.{}", quote_ident(alias), quote_ident(&self.name)),
            None => write!(f, "{}", quote_ident(&self.name)),
        }
    }
}

/// Scalar expression usable in projections, predicates and assignments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Value),
    /// NULL with an explicit type, e.g. `CAST(NULL AS DATE)`.
    TypedNull(&'static str),
    Fingerprint(Fingerprint),
}

impl Operand {
    /// Column qualified by a relation alias.
    pub fn col(alias: &str, name: &str) -> Self {
        Operand::Column(ColumnRef {
            alias: Some(alias.to_string()),
            name: name.to_string(),
        })
    }

    /// Unqualified column of the statement's target table.
    pub fn bare(name: &str) -> Self {
        Operand::Column(ColumnRef {
            alias: None,
            name: name.to_string(),
        })
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "NULL"),
        Value::Bool(true) => write!(f, "TRUE"),
        Value::Bool(false) => write!(f, "FALSE"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(x) if x.is_finite() => write!(f, "{x}"),
        Value::Float(x) => write!(f, "CAST({} AS DOUBLE)", quote_literal(&x.to_string())),
        Value::Text(s) => write!(f, "{}", quote_literal(s)),
        Value::Date(_) => write!(f, "DATE {}", quote_literal(&value.to_string())),
        Value::Timestamp(_) => write!(f, "TIMESTAMP {}", quote_literal(&value.to_string())),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(c) => write!(f, "{c}"),
            Operand::Literal(v) => write_literal(f, v),
            Operand::TypedNull(ty) => write!(f, "CAST(NULL AS {ty})"),
            Operand::Fingerprint(fp) => write!(f, "{fp}"),
        }
    }
}

/// Boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Operand, Operand),
    NotEq(Operand, Operand),
    IsNull(Operand),
    And(Vec<Predicate>),
    /// `operand IN (select)`; the select must project exactly one column.
    In {
        operand: Operand,
        select: Box<Select>,
    },
}

impl Predicate {
    pub fn eq(left: Operand, right: Operand) -> Self {
        Predicate::Eq(left, right)
    }

    pub fn not_eq(left: Operand, right: Operand) -> Self {
        Predicate::NotEq(left, right)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq(l, r) => write!(f, "{l} = {r}"),
            Predicate::NotEq(l, r) => write!(f, "{l} <> {r}"),
            Predicate::IsNull(o) => write!(f, "{o} IS NULL"),
            Predicate::And(parts) if parts.is_empty() => write!(f, "TRUE"),
            Predicate::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
                write!(f, "{}", rendered.join(" AND "))
            }
            Predicate::In { operand, select } => write!(f, "{operand} IN ({select})"),
        }
    }
}

/// A named table bound to an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub table: String,
    pub alias: String,
}

impl Relation {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} AS {}",
            quote_qualified(&self.table),
            quote_ident(&self.alias)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub relation: Relation,
    pub on: Predicate,
}

/// Projection entry.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `alias.*`
    AllFrom(String),
    Expr {
        operand: Operand,
        alias: Option<String>,
    },
}

impl SelectItem {
    pub fn expr(operand: Operand) -> Self {
        SelectItem::Expr {
            operand,
            alias: None,
        }
    }

    pub fn named(operand: Operand, alias: &str) -> Self {
        SelectItem::Expr {
            operand,
            alias: Some(alias.to_string()),
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::AllFrom(alias) => write!(f, "{}.*", quote_ident(alias)),
            SelectItem::Expr {
                operand,
                alias: None,
            } => write!(f, "{operand}"),
            SelectItem::Expr {
                operand,
                alias: Some(alias),
            } => write!(f, "{operand} AS {}", quote_ident(alias)),
        }
    }
}

/// Single-join select.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub from: Relation,
    pub join: Option<Join>,
    pub filter: Option<Predicate>,
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.items.iter().map(ToString::to_string).collect();
        write!(f, "SELECT {} FROM {}", items.join(", "), self.from)?;
        if let Some(join) = &self.join {
            let kind = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            write!(f, " {kind} {} ON {}", join.relation, join.on)?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        Ok(())
    }
}

/// A write against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTableAs {
        table: String,
        select: Select,
    },
    /// Insert with an explicit column list, matched to the select by position
    /// of the list, never by the physical column order of either table.
    InsertSelect {
        table: String,
        columns: Vec<String>,
        select: Select,
    },
    Update {
        table: String,
        assignments: Vec<(String, Operand)>,
        filter: Predicate,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateTableAs { table, select } => {
                write!(f, "CREATE TABLE {} AS {select}", quote_qualified(table))
            }
            Statement::InsertSelect {
                table,
                columns,
                select,
            } => {
                let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
                write!(
                    f,
                    "INSERT INTO {} ({}) {select}",
                    quote_qualified(table),
                    cols.join(", ")
                )
            }
            Statement::Update {
                table,
                assignments,
                filter,
            } => {
                let sets: Vec<String> = assignments
                    .iter()
                    .map(|(col, value)| format!("{} = {value}", quote_ident(col)))
                    .collect();
                write!(
                    f,
                    "UPDATE {} SET {} WHERE {filter}",
                    quote_qualified(table),
                    sets.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "relation_test.rs"]
mod tests;
