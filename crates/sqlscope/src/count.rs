//! Correlated count subqueries embedded in list queries.
//!
//! A list query returns its pagination metadata in the same round trip as the page of
//! rows by projecting two scalar subqueries against the listed table:
//!
//! - **total**: rows visible to the requester (archival + ownership), ignoring time bounds,
//! - **filtered**: the same rows narrowed by the filter's time bounds, ignoring pagination.
//!
//! Each subquery is returned as an [`Sql`] fragment carrying its own arguments. The
//! fragments do not include the surrounding parentheses.

use crate::dialect::Dialect;
use crate::ident::Ident;
use crate::list::ListQueryRequest;
use crate::predicate::{ID_COLUMN, Predicates, build_predicates, visibility_predicates};
use crate::sql::Sql;

/// `SELECT COUNT(<table>.id) FROM <table> [JOIN ...] [WHERE ...]`
fn count_select(dialect: Dialect, table: &Ident, joins: &[String], predicates: &Predicates) -> Sql {
    let mut sql = Sql::new("SELECT COUNT(");
    sql.push(&table.column(ID_COLUMN))
        .push(") FROM ")
        .push(&table.to_string());
    for join in joins {
        sql.push(" JOIN ").push(join);
    }
    predicates.append_where(dialect, &mut sql);
    sql
}

/// Count of rows in the requester's visibility scope, independent of time bounds.
pub fn total_count_subquery(dialect: Dialect, request: &ListQueryRequest) -> Sql {
    let predicates = visibility_predicates(
        request.table(),
        request.ownership_column(),
        request.requester_id(),
        request.for_admin(),
        request.filter().include_archived(),
    );
    count_select(dialect, request.table(), request.joins(), &predicates)
}

/// Count of rows matching every predicate of the listing, before pagination.
pub fn filtered_count_subquery(dialect: Dialect, request: &ListQueryRequest) -> Sql {
    let predicates = build_predicates(
        request.table(),
        request.ownership_column(),
        request.requester_id(),
        request.for_admin(),
        request.filter(),
    );
    count_select(dialect, request.table(), request.joins(), &predicates)
}
