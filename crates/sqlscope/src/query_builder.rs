//! The configured entry point.
//!
//! [`QueryBuilder`] is created once when the process is wired up and then shared freely:
//! it is `Copy`, holds no mutable state, and every method is a pure function of its inputs.

use crate::audit::{audit_predicate, render_audit_entries_query};
use crate::config::{DEFAULT_LOG_SQL_MAX_LEN, QbConfig};
use crate::dialect::Dialect;
use crate::error::QbResult;
use crate::filter::{DEFAULT_LIMIT, Filter, FilterParams, MAX_LIMIT};
use crate::list::{GeneratedQuery, ListQueryRequest, render_list_query};
use crate::predicate::Predicate;
use crate::scoped::{self, Owner, Table};
use crate::value::Value;

/// Query builder bound to one dialect and its page-size limits.
///
/// ```
/// use sqlscope::{Dialect, QueryBuilder, Table};
///
/// const WEBHOOKS: Table = Table::new("webhooks")
///     .with_ownership_column("belongs_to_account")
///     .with_columns(&["id", "name", "url"]);
///
/// let qb = QueryBuilder::new(Dialect::MariaDb);
/// let req = WEBHOOKS.list_request().requester_id(12).build()?;
/// let q = qb.build_list_query(&req)?;
/// assert_eq!(q.args.len(), 3);
/// # Ok::<(), sqlscope::QbError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryBuilder {
    dialect: Dialect,
    default_limit: u32,
    max_limit: u32,
    log_sql_max_len: usize,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            log_sql_max_len: DEFAULT_LOG_SQL_MAX_LEN,
        }
    }

    /// Validate `config` and build from it.
    pub fn from_config(config: &QbConfig) -> QbResult<Self> {
        config.validate()?;
        Ok(Self {
            dialect: config.dialect,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            log_sql_max_len: config.log_sql_max_len,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Turn raw request parameters into a [`Filter`] using this builder's page-size limits.
    pub fn filter_from_params(&self, params: FilterParams) -> QbResult<Filter> {
        params.into_filter(self.default_limit, self.max_limit)
    }

    fn traced(&self, query: GeneratedQuery, table: &str) -> GeneratedQuery {
        query.trace(self.dialect, table, self.log_sql_max_len);
        query
    }

    /// See [`crate::build_list_query`].
    pub fn build_list_query(&self, request: &ListQueryRequest) -> QbResult<GeneratedQuery> {
        let query = render_list_query(self.dialect, request)?;
        Ok(self.traced(query, &request.table().to_string()))
    }

    /// See [`crate::build_audit_predicate`].
    pub fn build_audit_predicate(
        &self,
        value: impl Into<Value>,
        json_key: &str,
    ) -> QbResult<(String, Vec<Value>)> {
        crate::audit::build_audit_predicate(self.dialect, value, json_key)
    }

    /// The audit predicate as a value, for composing with other predicates.
    pub fn audit_predicate(&self, value: impl Into<Value>, json_key: &str) -> QbResult<Predicate> {
        audit_predicate(value, json_key)
    }

    /// See [`crate::build_audit_entries_query`].
    pub fn build_audit_entries_query(
        &self,
        value: impl Into<Value>,
        json_keys: &[&str],
    ) -> QbResult<GeneratedQuery> {
        let query = render_audit_entries_query(self.dialect, value, json_keys)?;
        Ok(self.traced(query, crate::audit::AUDIT_LOG_TABLE))
    }

    pub fn build_exists_query(&self, table: &Table, owner: Owner, id: u64) -> QbResult<GeneratedQuery> {
        let sql = scoped::exists_sql(self.dialect, table, owner, id)?;
        scoped::finish(self.dialect, sql, table, self.log_sql_max_len)
    }

    pub fn build_get_query(&self, table: &Table, owner: Owner, id: u64) -> QbResult<GeneratedQuery> {
        let sql = scoped::get_sql(self.dialect, table, owner, id)?;
        scoped::finish(self.dialect, sql, table, self.log_sql_max_len)
    }

    pub fn build_all_count_query(&self, table: &Table) -> QbResult<GeneratedQuery> {
        let sql = scoped::all_count_sql(self.dialect, table)?;
        scoped::finish(self.dialect, sql, table, self.log_sql_max_len)
    }

    pub fn build_batch_query(
        &self,
        table: &Table,
        begin_id: u64,
        end_id: u64,
    ) -> QbResult<GeneratedQuery> {
        let sql = scoped::batch_sql(self.dialect, table, begin_id, end_id)?;
        scoped::finish(self.dialect, sql, table, self.log_sql_max_len)
    }

    pub fn build_archive_query(
        &self,
        table: &Table,
        owner: Owner,
        id: u64,
    ) -> QbResult<GeneratedQuery> {
        let sql = scoped::archive_sql(self.dialect, table, owner, id)?;
        scoped::finish(self.dialect, sql, table, self.log_sql_max_len)
    }
}
