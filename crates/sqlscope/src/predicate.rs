//! WHERE-clause predicates shared by every scoped query.
//!
//! Predicates are collected as values first and rendered later, so the order they are
//! pushed is exactly the order their arguments are bound. The visibility rules live here:
//!
//! - archived rows (`archived_on IS NULL`) are excluded unless an admin asked for them,
//! - non-admin requests are scoped to `<table>.<ownership_column> = <requester>`,
//! - the four time bounds follow, always in the order
//!   `created_on >`, `created_on <`, `last_updated_on >`, `last_updated_on <`.

use crate::dialect::Dialect;
use crate::filter::Filter;
use crate::ident::Ident;
use crate::sql::Sql;
use crate::value::Value;

/// Sequential row ID column, present on every table.
pub const ID_COLUMN: &str = "id";
/// Row creation time (Unix seconds).
pub const CREATED_ON_COLUMN: &str = "created_on";
/// Last update time (Unix seconds).
pub const LAST_UPDATED_ON_COLUMN: &str = "last_updated_on";
/// Soft-delete marker; `NULL` means live.
pub const ARCHIVED_ON_COLUMN: &str = "archived_on";

/// Comparison operator of a [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    fn to_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::Gt => " > ",
            CompareOp::Lt => " < ",
        }
    }
}

/// A single boolean condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `column IS NULL`
    IsNull { column: String },
    /// `column <op> ?`
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    /// The value stored under `key` in the JSON `column` equals a bound value.
    JsonKeyEquals {
        column: String,
        key: String,
        value: Value,
    },
    /// `(a OR b OR ...)`
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Predicate::IsNull {
            column: column.into(),
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column > value`
    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    /// `column < value`
    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    fn compare(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Number of values this predicate binds.
    pub fn arg_count(&self) -> usize {
        match self {
            Predicate::IsNull { .. } => 0,
            Predicate::Compare { .. } | Predicate::JsonKeyEquals { .. } => 1,
            Predicate::AnyOf(items) => items.iter().map(Predicate::arg_count).sum(),
        }
    }

    fn collect_args(&self, out: &mut Vec<Value>) {
        match self {
            Predicate::IsNull { .. } => {}
            Predicate::Compare { value, .. } | Predicate::JsonKeyEquals { value, .. } => {
                out.push(value.clone());
            }
            Predicate::AnyOf(items) => items.iter().for_each(|p| p.collect_args(out)),
        }
    }

    /// Append this predicate to `sql`, binding its values in order.
    pub fn append_to_sql(&self, dialect: Dialect, sql: &mut Sql) {
        match self {
            Predicate::IsNull { column } => {
                sql.push(column).push(" IS NULL");
            }
            Predicate::Compare { column, op, value } => {
                sql.push(column).push(op.to_sql()).push_bind(value.clone());
            }
            Predicate::JsonKeyEquals { column, key, value } => {
                sql.push(&dialect.json_key_equals_lhs(column, key, value))
                    .push_bind(value.clone());
            }
            Predicate::AnyOf(items) => match items.as_slice() {
                [] => {
                    sql.push("1=0");
                }
                [single] => single.append_to_sql(dialect, sql),
                _ => {
                    sql.push("(");
                    sql.push_separated(items, " OR ", |sql, p| p.append_to_sql(dialect, sql));
                    sql.push(")");
                }
            },
        }
    }
}

/// An ordered list of predicates joined with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Predicates(Vec<Predicate>);

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) -> &mut Self {
        self.0.push(predicate);
        self
    }

    pub fn extend(&mut self, other: Predicates) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.0.iter()
    }

    /// Bound values in render order.
    pub fn args(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for p in &self.0 {
            p.collect_args(&mut out);
        }
        out
    }

    /// Render as `a AND b AND ...` (empty when there are no predicates).
    pub fn to_sql(&self, dialect: Dialect) -> Sql {
        let mut sql = Sql::empty();
        self.append_to_sql(dialect, &mut sql);
        sql
    }

    /// Append `a AND b AND ...` to `sql`.
    pub fn append_to_sql(&self, dialect: Dialect, sql: &mut Sql) {
        sql.push_separated(&self.0, " AND ", |sql, p| p.append_to_sql(dialect, sql));
    }

    /// Append ` WHERE a AND b ...`, or nothing when empty.
    pub fn append_where(&self, dialect: Dialect, sql: &mut Sql) {
        if self.is_empty() {
            return;
        }
        sql.push(" WHERE ");
        self.append_to_sql(dialect, sql);
    }

    /// Render each predicate as its own fragment, with a single argument list matching the
    /// fragments read left to right.
    pub fn render(&self, dialect: Dialect) -> (Vec<String>, Vec<Value>) {
        let mut fragments = Vec::with_capacity(self.0.len());
        let mut args = Vec::new();
        for predicate in &self.0 {
            let mut sql = Sql::empty();
            predicate.append_to_sql(dialect, &mut sql);
            fragments.push(sql.render_from(dialect, args.len() + 1));
            args.extend(sql.into_params());
        }
        (fragments, args)
    }
}

impl From<Vec<Predicate>> for Predicates {
    fn from(v: Vec<Predicate>) -> Self {
        Predicates(v)
    }
}

impl<'a> IntoIterator for &'a Predicates {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Archival and ownership predicates, without time bounds.
///
/// - `archived_on IS NULL` unless `for_admin && include_archived`
/// - `<table>.<ownership_column> = requester_id` only when `!for_admin` and a column is given
pub fn visibility_predicates(
    table: &Ident,
    ownership_column: Option<&Ident>,
    requester_id: u64,
    for_admin: bool,
    include_archived: bool,
) -> Predicates {
    let mut out = Predicates::new();

    if !(for_admin && include_archived) {
        out.push(Predicate::is_null(table.column(ARCHIVED_ON_COLUMN)));
    }

    if !for_admin {
        if let Some(col) = ownership_column {
            out.push(Predicate::eq(table.column(col.name()), requester_id));
        }
    }

    out
}

/// The filter's time bounds, in fixed order, skipping unset ones.
pub fn time_range_predicates(table: &Ident, filter: &Filter) -> Predicates {
    let mut out = Predicates::new();
    let created = table.column(CREATED_ON_COLUMN);
    let updated = table.column(LAST_UPDATED_ON_COLUMN);

    if let Some(t) = filter.created_after() {
        out.push(Predicate::gt(&created, Value::Timestamp(t)));
    }
    if let Some(t) = filter.created_before() {
        out.push(Predicate::lt(&created, Value::Timestamp(t)));
    }
    if let Some(t) = filter.updated_after() {
        out.push(Predicate::gt(&updated, Value::Timestamp(t)));
    }
    if let Some(t) = filter.updated_before() {
        out.push(Predicate::lt(&updated, Value::Timestamp(t)));
    }

    out
}

/// Every predicate of a filtered listing: visibility first, then time bounds.
pub fn build_predicates(
    table: &Ident,
    ownership_column: Option<&Ident>,
    requester_id: u64,
    for_admin: bool,
    filter: &Filter,
) -> Predicates {
    let mut out = visibility_predicates(
        table,
        ownership_column,
        requester_id,
        for_admin,
        filter.include_archived(),
    );
    out.extend(time_range_predicates(table, filter));
    out
}
