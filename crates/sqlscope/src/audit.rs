//! Audit-trail lookups by JSON context key.
//!
//! Audit log rows store the IDs of the entities an event touched in a JSON `context`
//! column (`{"item_id": 7, "performed_by": 3}`). Fetching the trail of one entity means
//! matching a key of that object against the entity ID. The ID is always bound as a
//! parameter; only the key, which is a validated identifier, is written into the SQL text.

use crate::config::DEFAULT_LOG_SQL_MAX_LEN;
use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::ident::Ident;
use crate::list::GeneratedQuery;
use crate::predicate::{CREATED_ON_COLUMN, ID_COLUMN, Predicate};
use crate::sql::Sql;
use crate::value::Value;

/// Audit log table.
pub const AUDIT_LOG_TABLE: &str = "audit_log";
/// JSON column holding the event context.
pub const AUDIT_LOG_CONTEXT_COLUMN: &str = "context";
/// Event type column.
pub const AUDIT_LOG_EVENT_TYPE_COLUMN: &str = "event_type";

/// Projection of [`build_audit_entries_query`].
pub const AUDIT_LOG_COLUMNS: &[&str] = &[
    ID_COLUMN,
    AUDIT_LOG_EVENT_TYPE_COLUMN,
    AUDIT_LOG_CONTEXT_COLUMN,
    CREATED_ON_COLUMN,
];

fn qualified(column: &str) -> String {
    format!("{AUDIT_LOG_TABLE}.{column}")
}

/// Predicate matching audit entries whose context maps `json_key` to `value`.
pub fn audit_predicate(value: impl Into<Value>, json_key: &str) -> QbResult<Predicate> {
    let key = Ident::parse_single(json_key)?;
    let value = value.into();
    if value.is_null() {
        return Err(QbError::invalid_request(format!(
            "audit lookup on '{key}' needs a non-null value"
        )));
    }
    Ok(Predicate::JsonKeyEquals {
        column: qualified(AUDIT_LOG_CONTEXT_COLUMN),
        key: key.to_string(),
        value,
    })
}

/// Render the audit predicate on its own, for splicing into a caller-built `WHERE`.
///
/// ```
/// use sqlscope::{Dialect, Value, build_audit_predicate};
///
/// let (fragment, args) = build_audit_predicate(Dialect::Sqlite, 777u64, "item_id")?;
/// assert_eq!(fragment, "json_extract(audit_log.context, '$.item_id') = ?");
/// assert_eq!(args, vec![Value::Integer(777)]);
/// # Ok::<(), sqlscope::QbError>(())
/// ```
pub fn build_audit_predicate(
    dialect: Dialect,
    value: impl Into<Value>,
    json_key: &str,
) -> QbResult<(String, Vec<Value>)> {
    let predicate = audit_predicate(value, json_key)?;
    let mut sql = Sql::empty();
    predicate.append_to_sql(dialect, &mut sql);
    Ok((sql.render(dialect), sql.into_params()))
}

pub(crate) fn render_audit_entries_query(
    dialect: Dialect,
    value: impl Into<Value>,
    json_keys: &[&str],
) -> QbResult<GeneratedQuery> {
    if json_keys.is_empty() {
        return Err(QbError::invalid_request("audit lookup needs at least one key"));
    }
    let value = value.into();
    let predicates = json_keys
        .iter()
        .map(|key| audit_predicate(value.clone(), key))
        .collect::<QbResult<Vec<_>>>()?;

    let mut sql = Sql::new("SELECT ");
    sql.push_separated(AUDIT_LOG_COLUMNS, ", ", |sql, c| {
        sql.push(&qualified(c));
    });
    sql.push(" FROM ").push(AUDIT_LOG_TABLE).push(" WHERE ");
    Predicate::AnyOf(predicates).append_to_sql(dialect, &mut sql);
    sql.push(" ORDER BY ").push(&qualified(CREATED_ON_COLUMN));

    GeneratedQuery::finish(sql, dialect, AUDIT_LOG_TABLE)
}

/// Audit entries whose context maps any of `json_keys` to `value`, oldest first.
///
/// Each key binds its own copy of `value`.
pub fn build_audit_entries_query(
    dialect: Dialect,
    value: impl Into<Value>,
    json_keys: &[&str],
) -> QbResult<GeneratedQuery> {
    let query = render_audit_entries_query(dialect, value, json_keys)?;
    query.trace(dialect, AUDIT_LOG_TABLE, DEFAULT_LOG_SQL_MAX_LEN);
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_per_dialect() {
        let (mariadb, _) = build_audit_predicate(Dialect::MariaDb, 777u64, "item_id").unwrap();
        assert_eq!(mariadb, "JSON_EXTRACT(audit_log.context, '$.item_id') = ?");

        let (pg, args) = build_audit_predicate(Dialect::Postgres, 777u64, "item_id").unwrap();
        assert_eq!(pg, "(audit_log.context->>'item_id')::BIGINT = $1");
        assert_eq!(args, vec![Value::Integer(777)]);
    }

    #[test]
    fn test_value_never_in_text() {
        for dialect in Dialect::ALL {
            let (fragment, args) = build_audit_predicate(dialect, 777u64, "item_id").unwrap();
            assert!(!fragment.contains("777"), "{dialect}: {fragment}");
            assert_eq!(args, vec![Value::Integer(777)]);
        }
    }

    #[test]
    fn test_rejects_bad_keys_and_null() {
        assert!(build_audit_predicate(Dialect::Sqlite, 1u64, "item_id') OR 1=1 --").is_err());
        assert!(build_audit_predicate(Dialect::Sqlite, 1u64, "a.b").is_err());
        assert!(build_audit_predicate(Dialect::Sqlite, None::<u64>, "item_id").is_err());
    }

    #[test]
    fn test_entries_query_single_key() {
        let q = build_audit_entries_query(Dialect::Sqlite, 5u64, &["item_id"]).unwrap();
        assert_eq!(
            q.sql,
            "SELECT audit_log.id, audit_log.event_type, audit_log.context, audit_log.created_on \
             FROM audit_log WHERE json_extract(audit_log.context, '$.item_id') = ? \
             ORDER BY audit_log.created_on"
        );
        assert_eq!(q.args, vec![Value::Integer(5)]);
    }

    #[test]
    fn test_entries_query_multiple_keys() {
        let q = build_audit_entries_query(Dialect::Postgres, 3u64, &["user_id", "performed_by"])
            .unwrap();
        assert!(q.sql.contains(
            "WHERE ((audit_log.context->>'user_id')::BIGINT = $1 OR (audit_log.context->>'performed_by')::BIGINT = $2)"
        ));
        assert_eq!(q.args, vec![Value::Integer(3), Value::Integer(3)]);
    }

    #[test]
    fn test_entries_query_needs_keys() {
        let err = build_audit_entries_query(Dialect::MariaDb, 3u64, &[]).unwrap_err();
        assert!(err.is_invalid_request());
    }
}
