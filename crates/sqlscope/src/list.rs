//! Paginated list queries with embedded total/filtered counts.
//!
//! The rendered statement has the shape
//!
//! ```text
//! SELECT <columns>,
//!        (<filtered count>) AS filtered_count,
//!        (<total count>) AS total_count
//! FROM <table> [JOIN ...]
//! [WHERE <visibility + time bounds>]
//! GROUP BY <table>.id
//! [ORDER BY <table>.created_on ASC|DESC]
//! LIMIT <limit> OFFSET <offset>
//! ```
//!
//! and its arguments are exactly the filtered-count args, then the total-count args, then
//! the outer WHERE args, which is the left-to-right order their placeholders appear in.
//!
//! # Example
//!
//! ```
//! use sqlscope::{Dialect, Filter, ListQueryRequest, Value, build_list_query};
//!
//! let req = ListQueryRequest::builder("items")
//!     .ownership_column("belongs_to_account")
//!     .columns(["items.id", "items.name"])
//!     .requester_id(42)
//!     .filter(Some(Filter::builder().page(10).build()?))
//!     .build()?;
//!
//! let q = build_list_query(Dialect::Sqlite, &req)?;
//! assert!(q.sql.ends_with("GROUP BY items.id LIMIT 20 OFFSET 180"));
//! assert_eq!(q.args, vec![Value::Integer(42); 3]);
//! # Ok::<(), sqlscope::QbError>(())
//! ```

use crate::config::DEFAULT_LOG_SQL_MAX_LEN;
use crate::count::{filtered_count_subquery, total_count_subquery};
use crate::dialect::{Dialect, count_placeholders};
use crate::error::{QbError, QbResult};
use crate::filter::Filter;
use crate::ident::Ident;
use crate::predicate::{CREATED_ON_COLUMN, ID_COLUMN, build_predicates};
use crate::sql::Sql;
use crate::value::Value;
use serde::Serialize;

/// Projection alias of the filtered count subquery.
pub const FILTERED_COUNT_ALIAS: &str = "filtered_count";
/// Projection alias of the total count subquery.
pub const TOTAL_COUNT_ALIAS: &str = "total_count";

/// A validated request for one page of a table.
///
/// Built with [`ListQueryRequest::builder`] (or [`crate::Table::list_request`]); every
/// contract violation is reported by [`ListQueryRequestBuilder::build`], so a value of this
/// type always renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQueryRequest {
    table: Ident,
    ownership_column: Option<Ident>,
    columns: Vec<Ident>,
    joins: Vec<String>,
    requester_id: u64,
    for_admin: bool,
    filter: Filter,
}

impl ListQueryRequest {
    /// Start a request against `table`.
    pub fn builder(table: impl Into<String>) -> ListQueryRequestBuilder {
        ListQueryRequestBuilder {
            table: table.into(),
            ownership_column: None,
            columns: Vec::new(),
            joins: Vec::new(),
            requester_id: None,
            for_admin: false,
            filter: None,
        }
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn ownership_column(&self) -> Option<&Ident> {
        self.ownership_column.as_ref()
    }

    pub fn columns(&self) -> &[Ident] {
        &self.columns
    }

    pub fn joins(&self) -> &[String] {
        &self.joins
    }

    pub fn requester_id(&self) -> u64 {
        self.requester_id
    }

    pub fn for_admin(&self) -> bool {
        self.for_admin
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

/// Builder for [`ListQueryRequest`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ListQueryRequestBuilder {
    table: String,
    ownership_column: Option<String>,
    columns: Vec<String>,
    joins: Vec<String>,
    requester_id: Option<u64>,
    for_admin: bool,
    filter: Option<Filter>,
}

impl ListQueryRequestBuilder {
    /// Column (unqualified) holding the owning user/account ID.
    pub fn ownership_column(mut self, column: impl Into<String>) -> Self {
        self.ownership_column = Some(column.into());
        self
    }

    /// Append one projected column, e.g. `items.name`.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Append several projected columns, in order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a raw join clause, written after `JOIN` in the outer query and both counts.
    ///
    /// The clause is trusted SQL text; never build it from user input.
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// ID the ownership column is compared against. Required unless `for_admin`.
    pub fn requester_id(mut self, id: u64) -> Self {
        self.requester_id = Some(id);
        self
    }

    pub fn for_admin(mut self, for_admin: bool) -> Self {
        self.for_admin = for_admin;
        self
    }

    /// Page and time bounds. `None` means page 1 with the default page size.
    pub fn filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }

    /// Validate the request.
    pub fn build(self) -> QbResult<ListQueryRequest> {
        let table = Ident::parse(&self.table)?;

        let ownership_column = self
            .ownership_column
            .as_deref()
            .map(Ident::parse_single)
            .transpose()?;

        if !self.for_admin && ownership_column.is_none() {
            return Err(QbError::invalid_request(format!(
                "non-admin listing of '{table}' requires an ownership column"
            )));
        }
        let requester_id = match (self.requester_id, self.for_admin) {
            (Some(id), _) => id,
            (None, true) => 0,
            (None, false) => {
                return Err(QbError::invalid_request(format!(
                    "non-admin listing of '{table}' requires a requester id"
                )));
            }
        };

        if self.columns.is_empty() {
            return Err(QbError::invalid_request(format!(
                "listing of '{table}' projects no columns"
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Ident::parse(c))
            .collect::<QbResult<Vec<_>>>()?;

        for join in &self.joins {
            if join.trim().is_empty() || join.contains(';') {
                return Err(QbError::invalid_request(format!("invalid join clause '{join}'")));
            }
        }

        Ok(ListQueryRequest {
            table,
            ownership_column,
            columns,
            joins: self.joins,
            requester_id,
            for_admin: self.for_admin,
            filter: self.filter.unwrap_or_default(),
        })
    }
}

/// SQL text plus its positional arguments, ready for an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedQuery {
    pub sql: String,
    pub args: Vec<Value>,
}

impl GeneratedQuery {
    /// Render `sql` for `dialect` and check the placeholder count against the arguments.
    pub(crate) fn finish(sql: Sql, dialect: Dialect, table: &str) -> QbResult<Self> {
        let text = sql.render(dialect);
        let args = sql.into_params();

        let placeholders = count_placeholders(&text, dialect.placeholder_style());
        if placeholders != args.len() {
            tracing::error!(
                target: "sqlscope.query",
                query_error = true,
                table,
                dialect = dialect.name(),
                placeholders,
                args = args.len(),
                sql = %truncate_sql(&text, DEFAULT_LOG_SQL_MAX_LEN),
                "placeholder/argument mismatch"
            );
            return Err(QbError::internal(format!(
                "query on '{table}' has {placeholders} placeholders but {} args",
                args.len()
            )));
        }

        Ok(Self { sql: text, args })
    }

    pub(crate) fn trace(&self, dialect: Dialect, table: &str, max_sql_len: usize) {
        tracing::trace!(
            target: "sqlscope.query",
            table,
            dialect = dialect.name(),
            args = self.args.len(),
            sql = %truncate_sql(&self.sql, max_sql_len),
            "built query"
        );
    }

    /// Arguments as tokio-postgres parameters.
    #[cfg(feature = "postgres")]
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.args
            .iter()
            .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

pub(crate) fn truncate_sql(sql: &str, max_bytes: usize) -> String {
    if sql.len() <= max_bytes {
        return sql.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}

pub(crate) fn render_list_query(dialect: Dialect, request: &ListQueryRequest) -> QbResult<GeneratedQuery> {
    let table = request.table();
    let filter = request.filter();

    let filtered = filtered_count_subquery(dialect, request);
    let total = total_count_subquery(dialect, request);
    let outer = build_predicates(
        table,
        request.ownership_column(),
        request.requester_id(),
        request.for_admin(),
        filter,
    );

    let mut sql = Sql::new("SELECT ");
    sql.push_separated(request.columns(), ", ", |sql, c| {
        sql.push(&c.to_string());
    });
    sql.push(", (")
        .push_sql(filtered)
        .push(") AS ")
        .push(FILTERED_COUNT_ALIAS)
        .push(", (")
        .push_sql(total)
        .push(") AS ")
        .push(TOTAL_COUNT_ALIAS)
        .push(" FROM ")
        .push(&table.to_string());
    for join in request.joins() {
        sql.push(" JOIN ").push(join);
    }
    outer.append_where(dialect, &mut sql);

    sql.push(" GROUP BY ").push(&table.column(ID_COLUMN));
    if let Some(dir) = filter.sort_by() {
        sql.push(" ORDER BY ")
            .push(&table.column(CREATED_ON_COLUMN))
            .push(" ")
            .push(dir.to_sql());
    }
    sql.push(&format!(" LIMIT {} OFFSET {}", filter.limit(), filter.offset()));

    GeneratedQuery::finish(sql, dialect, &table.to_string())
}

/// Build the page query for `request`.
pub fn build_list_query(dialect: Dialect, request: &ListQueryRequest) -> QbResult<GeneratedQuery> {
    let query = render_list_query(dialect, request)?;
    query.trace(dialect, &request.table().to_string(), DEFAULT_LOG_SQL_MAX_LEN);
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;

    fn items(filter: Filter) -> ListQueryRequest {
        ListQueryRequest::builder("items")
            .ownership_column("belongs_to_account")
            .columns(["items.id", "items.name"])
            .requester_id(42)
            .filter(Some(filter))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_rejects_contract_violations() {
        let no_owner = ListQueryRequest::builder("items").column("items.id").build();
        assert!(no_owner.unwrap_err().is_invalid_request());

        let empty_table = ListQueryRequest::builder("")
            .for_admin(true)
            .column("id")
            .build();
        assert!(empty_table.unwrap_err().is_invalid_request());

        let no_columns = ListQueryRequest::builder("items").for_admin(true).build();
        assert!(no_columns.unwrap_err().is_invalid_request());

        let bad_column = ListQueryRequest::builder("items")
            .for_admin(true)
            .column("items.id; DROP TABLE items")
            .build();
        assert!(bad_column.unwrap_err().is_invalid_request());

        let bad_join = ListQueryRequest::builder("items")
            .for_admin(true)
            .column("items.id")
            .join("users ON 1=1; --")
            .build();
        assert!(bad_join.unwrap_err().is_invalid_request());
    }

    #[test]
    fn test_tenant_listing_requires_requester() {
        let err = ListQueryRequest::builder("items")
            .ownership_column("belongs_to_account")
            .column("items.id")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_request());
        assert!(err.to_string().contains("requester id"));

        let admin = ListQueryRequest::builder("items")
            .ownership_column("belongs_to_account")
            .column("items.id")
            .for_admin(true)
            .build()
            .unwrap();
        assert_eq!(admin.requester_id(), 0);
    }

    #[test]
    fn test_absent_filter_defaults() {
        let req = ListQueryRequest::builder("items")
            .ownership_column("belongs_to_account")
            .column("items.id")
            .requester_id(1)
            .build()
            .unwrap();
        assert_eq!(req.filter(), &Filter::default());
    }

    #[test]
    fn test_list_query_sqlite() {
        let q = build_list_query(Dialect::Sqlite, &items(Filter::default())).unwrap();
        assert_eq!(
            q.sql,
            "SELECT items.id, items.name, \
             (SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = ?) AS filtered_count, \
             (SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = ?) AS total_count \
             FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = ? \
             GROUP BY items.id LIMIT 20 OFFSET 0"
        );
        assert_eq!(q.args, vec![Value::Integer(42); 3]);
    }

    #[test]
    fn test_list_query_postgres_numbering_and_order() {
        let filter = Filter::builder()
            .page(2)
            .limit(5)
            .created_after(100u64)
            .sort_by(SortDirection::Desc)
            .build()
            .unwrap();
        let q = build_list_query(Dialect::Postgres, &items(filter)).unwrap();
        assert_eq!(
            q.sql,
            "SELECT items.id, items.name, \
             (SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = $1 AND items.created_on > $2) AS filtered_count, \
             (SELECT COUNT(items.id) FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = $3) AS total_count \
             FROM items WHERE items.archived_on IS NULL AND items.belongs_to_account = $4 AND items.created_on > $5 \
             GROUP BY items.id ORDER BY items.created_on DESC LIMIT 5 OFFSET 5"
        );
        assert_eq!(
            q.args,
            vec![
                Value::Integer(42),
                Value::Timestamp(100),
                Value::Integer(42),
                Value::Integer(42),
                Value::Timestamp(100),
            ]
        );
    }

    #[test]
    fn test_joins_follow_from() {
        let req = ListQueryRequest::builder("accounts")
            .ownership_column("belongs_to_user")
            .columns(["accounts.id", "account_user_memberships.account_roles"])
            .join("account_user_memberships ON account_user_memberships.belongs_to_account = accounts.id")
            .requester_id(9)
            .build()
            .unwrap();
        let q = build_list_query(Dialect::MariaDb, &req).unwrap();
        assert_eq!(
            q.sql.matches("FROM accounts JOIN account_user_memberships ON").count(),
            3
        );
        assert_eq!(q.args.len(), 3);
    }

    #[test]
    fn test_finish_detects_mismatch() {
        // a literal '?' outside quotes without a bound value
        let sql = Sql::new("SELECT 1 WHERE a = ?");
        let err = GeneratedQuery::finish(sql, Dialect::Sqlite, "t").unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 1", 3), "SEL...");
        assert_eq!(truncate_sql("é", 1), "...");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_params_ref_len() {
        let q = build_list_query(Dialect::Postgres, &items(Filter::default())).unwrap();
        assert_eq!(q.params_ref().len(), q.args.len());
    }
}
