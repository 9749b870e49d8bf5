//! Table descriptors and single-entity queries scoped to an owner.
//!
//! A [`Table`] is a `const` description of one soft-deletable table: its name, the column
//! that ties a row to its owning user/account (if any), and the columns a read projects.
//! Every query built from it follows the same visibility rules as list queries: archived
//! rows are invisible, and non-admin callers only ever see their own rows.
//!
//! # Example
//!
//! ```
//! use sqlscope::{Dialect, Owner, Table, Value, build_exists_query};
//!
//! const ITEMS: Table = Table::new("items")
//!     .with_ownership_column("belongs_to_account")
//!     .with_columns(&["id", "name", "details"]);
//!
//! let q = build_exists_query(Dialect::Postgres, &ITEMS, Owner::User(3), 7)?;
//! assert_eq!(
//!     q.sql,
//!     "SELECT EXISTS ( SELECT items.id FROM items WHERE items.archived_on IS NULL \
//!      AND items.belongs_to_account = $1 AND items.id = $2 )"
//! );
//! assert_eq!(q.args, vec![Value::Integer(3), Value::Integer(7)]);
//! # Ok::<(), sqlscope::QbError>(())
//! ```

use crate::config::DEFAULT_LOG_SQL_MAX_LEN;
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::ident::Ident;
use crate::list::{GeneratedQuery, ListQueryRequest, ListQueryRequestBuilder};
use crate::predicate::{
    ARCHIVED_ON_COLUMN, ID_COLUMN, LAST_UPDATED_ON_COLUMN, Predicate, Predicates,
    visibility_predicates,
};
use crate::sql::Sql;

/// Static description of a soft-deletable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: &'static str,
    /// Unqualified column holding the owner ID. `None` for global tables.
    pub ownership_column: Option<&'static str>,
    /// Projected columns. Unqualified names are qualified with the table name.
    pub columns: &'static [&'static str],
}

impl Table {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            ownership_column: None,
            columns: &[ID_COLUMN],
        }
    }

    pub const fn with_ownership_column(mut self, column: &'static str) -> Self {
        self.ownership_column = Some(column);
        self
    }

    pub const fn with_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = columns;
        self
    }

    /// Validated table name.
    pub fn ident(&self) -> QbResult<Ident> {
        Ident::parse(self.name)
    }

    /// `columns`, each qualified as `<table>.<column>` unless it already names a table.
    pub fn qualified_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| {
                if c.contains('.') {
                    (*c).to_string()
                } else {
                    format!("{}.{c}", self.name)
                }
            })
            .collect()
    }

    /// Start a list request projecting this table's columns.
    pub fn list_request(&self) -> ListQueryRequestBuilder {
        let builder = ListQueryRequest::builder(self.name).columns(self.qualified_columns());
        match self.ownership_column {
            Some(column) => builder.ownership_column(column),
            None => builder,
        }
    }
}

/// Who a scoped query runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A user or account; only its own rows are visible.
    User(u64),
    /// A service admin; rows of every owner are visible.
    Admin,
}

impl Owner {
    fn requester(self) -> (u64, bool) {
        match self {
            Owner::User(id) => (id, false),
            Owner::Admin => (0, true),
        }
    }
}

struct Scope {
    table: Ident,
    ownership_column: Option<Ident>,
}

impl Scope {
    fn resolve(table: &Table, owner: Owner) -> QbResult<Self> {
        let ident = table.ident()?;
        let ownership_column = table.ownership_column.map(Ident::parse_single).transpose()?;
        if matches!(owner, Owner::User(_)) && ownership_column.is_none() {
            return Err(QbError::invalid_request(format!(
                "table '{ident}' has no ownership column to scope a user query"
            )));
        }
        Ok(Self {
            table: ident,
            ownership_column,
        })
    }

    /// Live rows of `owner` with the given ID, qualified with the table name.
    fn entity_predicates(&self, owner: Owner, id: u64) -> Predicates {
        let (requester_id, for_admin) = owner.requester();
        let mut predicates = visibility_predicates(
            &self.table,
            self.ownership_column.as_ref(),
            requester_id,
            for_admin,
            false,
        );
        predicates.push(Predicate::eq(self.table.column(ID_COLUMN), id));
        predicates
    }
}

pub(crate) fn finish(
    dialect: Dialect,
    sql: Sql,
    table: &Table,
    log_sql_max_len: usize,
) -> QbResult<GeneratedQuery> {
    let query = GeneratedQuery::finish(sql, dialect, table.name)?;
    query.trace(dialect, table.name, log_sql_max_len);
    Ok(query)
}

fn select_columns(table: &Table) -> QbResult<Sql> {
    let ident = table.ident()?;
    let columns = table
        .qualified_columns()
        .iter()
        .map(|c| Ident::parse(c))
        .collect::<QbResult<Vec<_>>>()?;

    let mut sql = Sql::new("SELECT ");
    sql.push_separated(&columns, ", ", |sql, c| {
        sql.push(&c.to_string());
    });
    sql.push(" FROM ").push(&ident.to_string());
    Ok(sql)
}

pub(crate) fn exists_sql(dialect: Dialect, table: &Table, owner: Owner, id: u64) -> QbResult<Sql> {
    let scope = Scope::resolve(table, owner)?;
    let mut sql = Sql::new("SELECT EXISTS ( SELECT ");
    sql.push(&scope.table.column(ID_COLUMN))
        .push(" FROM ")
        .push(table.name);
    scope.entity_predicates(owner, id).append_where(dialect, &mut sql);
    sql.push(" )");
    Ok(sql)
}

pub(crate) fn get_sql(dialect: Dialect, table: &Table, owner: Owner, id: u64) -> QbResult<Sql> {
    let scope = Scope::resolve(table, owner)?;
    let mut sql = select_columns(table)?;
    scope.entity_predicates(owner, id).append_where(dialect, &mut sql);
    Ok(sql)
}

pub(crate) fn all_count_sql(dialect: Dialect, table: &Table) -> QbResult<Sql> {
    let ident = table.ident()?;
    let mut sql = Sql::new("SELECT COUNT(");
    sql.push(&ident.column(ID_COLUMN)).push(") FROM ").push(table.name);
    Predicates::from(vec![Predicate::is_null(ident.column(ARCHIVED_ON_COLUMN))])
        .append_where(dialect, &mut sql);
    Ok(sql)
}

pub(crate) fn batch_sql(dialect: Dialect, table: &Table, begin_id: u64, end_id: u64) -> QbResult<Sql> {
    let ident = table.ident()?;
    let id = ident.column(ID_COLUMN);
    let mut sql = select_columns(table)?;
    Predicates::from(vec![Predicate::gt(&id, begin_id), Predicate::lt(&id, end_id)])
        .append_where(dialect, &mut sql);
    Ok(sql)
}

pub(crate) fn archive_sql(dialect: Dialect, table: &Table, owner: Owner, id: u64) -> QbResult<Sql> {
    let scope = Scope::resolve(table, owner)?;
    let now = dialect.current_time_expression();

    let mut sql = Sql::new("UPDATE ");
    sql.push(table.name)
        .push(" SET ")
        .push(&format!("{LAST_UPDATED_ON_COLUMN} = {now}, {ARCHIVED_ON_COLUMN} = {now}"));

    // UPDATE targets a single table, so columns stay unqualified
    let mut predicates = Predicates::new();
    predicates.push(Predicate::is_null(ARCHIVED_ON_COLUMN));
    if let (Owner::User(owner_id), Some(column)) = (owner, &scope.ownership_column) {
        predicates.push(Predicate::eq(column.name(), owner_id));
    }
    predicates.push(Predicate::eq(ID_COLUMN, id));
    predicates.append_where(dialect, &mut sql);
    Ok(sql)
}

/// `SELECT EXISTS ( SELECT t.id FROM t WHERE <visible to owner> AND t.id = ? )`
pub fn build_exists_query(
    dialect: Dialect,
    table: &Table,
    owner: Owner,
    id: u64,
) -> QbResult<GeneratedQuery> {
    let sql = exists_sql(dialect, table, owner, id)?;
    finish(dialect, sql, table, DEFAULT_LOG_SQL_MAX_LEN)
}

/// Read one live row of `owner` by ID.
pub fn build_get_query(
    dialect: Dialect,
    table: &Table,
    owner: Owner,
    id: u64,
) -> QbResult<GeneratedQuery> {
    let sql = get_sql(dialect, table, owner, id)?;
    finish(dialect, sql, table, DEFAULT_LOG_SQL_MAX_LEN)
}

/// Count every live row of the table, across owners.
pub fn build_all_count_query(dialect: Dialect, table: &Table) -> QbResult<GeneratedQuery> {
    let sql = all_count_sql(dialect, table)?;
    finish(dialect, sql, table, DEFAULT_LOG_SQL_MAX_LEN)
}

/// Rows with `begin_id < id < end_id`, archived or not, for batch jobs.
pub fn build_batch_query(
    dialect: Dialect,
    table: &Table,
    begin_id: u64,
    end_id: u64,
) -> QbResult<GeneratedQuery> {
    let sql = batch_sql(dialect, table, begin_id, end_id)?;
    finish(dialect, sql, table, DEFAULT_LOG_SQL_MAX_LEN)
}

/// Soft-delete one live row of `owner`, stamping `last_updated_on` and `archived_on`.
pub fn build_archive_query(
    dialect: Dialect,
    table: &Table,
    owner: Owner,
    id: u64,
) -> QbResult<GeneratedQuery> {
    let sql = archive_sql(dialect, table, owner, id)?;
    finish(dialect, sql, table, DEFAULT_LOG_SQL_MAX_LEN)
}
