//! SQL dialects.
//!
//! A [`Dialect`] captures the handful of syntax differences the builders care about:
//! placeholder style, the "current Unix time" expression, and how a key of a JSON
//! column is compared against a bound value. Everything else in generated SQL is
//! shared across engines.

use crate::error::{QbError, QbResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How bound parameters are written into the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// `?` for every parameter (MariaDB/MySQL, SQLite).
    Question,
    /// `$1`, `$2`, ... (Postgres).
    Dollar,
}

impl PlaceholderStyle {
    /// Write the placeholder for the parameter at 1-based `index`.
    pub(crate) fn write(self, out: &mut String, index: usize) {
        match self {
            PlaceholderStyle::Question => out.push('?'),
            PlaceholderStyle::Dollar => {
                use std::fmt::Write;
                let _ = write!(out, "${index}");
            }
        }
    }
}

/// A supported SQL engine.
///
/// Constructed once by process wiring (usually via [`crate::QbConfig`]) and passed to
/// [`crate::QueryBuilder`]; it is `Copy` and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// MariaDB / MySQL.
    #[serde(alias = "mysql")]
    MariaDb,
    /// SQLite 3 (with the JSON1 functions).
    Sqlite,
    /// PostgreSQL.
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 3] = [Dialect::MariaDb, Dialect::Sqlite, Dialect::Postgres];

    /// Short lowercase name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::MariaDb => "mariadb",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Placeholder style used by this engine.
    pub const fn placeholder_style(self) -> PlaceholderStyle {
        match self {
            Dialect::MariaDb | Dialect::Sqlite => PlaceholderStyle::Question,
            Dialect::Postgres => PlaceholderStyle::Dollar,
        }
    }

    /// SQL expression evaluating to the current Unix timestamp (seconds).
    pub const fn current_time_expression(self) -> &'static str {
        match self {
            Dialect::MariaDb => "UNIX_TIMESTAMP()",
            Dialect::Sqlite => "(strftime('%s','now'))",
            Dialect::Postgres => "extract(epoch FROM NOW())",
        }
    }

    /// Left-hand side of a "JSON key equals bound value" predicate, including the operator.
    ///
    /// The caller appends exactly one bound parameter after it. `column` is the qualified
    /// JSON column (`audit_log.context`) and `key` a single validated identifier, so
    /// neither can carry quotes into the literal path.
    ///
    /// Postgres' `->>` yields text, so integer values are compared after a `BIGINT` cast.
    pub(crate) fn json_key_equals_lhs(self, column: &str, key: &str, value: &Value) -> String {
        match self {
            Dialect::MariaDb => format!("JSON_EXTRACT({column}, '$.{key}') = "),
            Dialect::Sqlite => format!("json_extract({column}, '$.{key}') = "),
            Dialect::Postgres => match value {
                Value::Integer(_) | Value::Timestamp(_) => {
                    format!("({column}->>'{key}')::BIGINT = ")
                }
                Value::Text(_) | Value::Null => format!("{column}->>'{key}' = "),
            },
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = QbError;

    fn from_str(s: &str) -> QbResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mariadb" | "mysql" => Ok(Dialect::MariaDb),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(QbError::config(format!("unknown SQL dialect '{other}'"))),
        }
    }
}

/// Count the placeholders in `sql` for the given style, ignoring anything inside
/// single-quoted string literals (`'$.item_id'`, `'%s'`).
pub fn count_placeholders(sql: &str, style: PlaceholderStyle) -> usize {
    let mut count = 0;
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            // '' inside a literal is an escaped quote: toggling twice keeps us inside
            in_literal = !in_literal;
            continue;
        }
        if in_literal {
            continue;
        }
        match style {
            PlaceholderStyle::Question if c == '?' => count += 1,
            PlaceholderStyle::Dollar if c == '$' => {
                if chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    count += 1;
                    while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                        chars.next();
                    }
                }
            }
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MariaDb);
        assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MariaDb);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_current_time_expressions() {
        assert_eq!(Dialect::MariaDb.current_time_expression(), "UNIX_TIMESTAMP()");
        assert_eq!(Dialect::Sqlite.current_time_expression(), "(strftime('%s','now'))");
        assert_eq!(Dialect::Postgres.current_time_expression(), "extract(epoch FROM NOW())");
    }

    #[test]
    fn test_json_lhs() {
        let v = Value::Integer(7);
        assert_eq!(
            Dialect::Sqlite.json_key_equals_lhs("audit_log.context", "item_id", &v),
            "json_extract(audit_log.context, '$.item_id') = "
        );
        assert_eq!(
            Dialect::MariaDb.json_key_equals_lhs("audit_log.context", "item_id", &v),
            "JSON_EXTRACT(audit_log.context, '$.item_id') = "
        );
        assert_eq!(
            Dialect::Postgres.json_key_equals_lhs("audit_log.context", "item_id", &v),
            "(audit_log.context->>'item_id')::BIGINT = "
        );
        assert_eq!(
            Dialect::Postgres.json_key_equals_lhs(
                "audit_log.context",
                "event",
                &Value::Text("x".into())
            ),
            "audit_log.context->>'event' = "
        );
    }

    #[test]
    fn test_count_placeholders_question() {
        let sql = "UPDATE t SET a = (strftime('%s','now')) WHERE b = ? AND c = ?";
        assert_eq!(count_placeholders(sql, PlaceholderStyle::Question), 2);
        assert_eq!(count_placeholders("SELECT '?'", PlaceholderStyle::Question), 0);
    }

    #[test]
    fn test_count_placeholders_dollar() {
        let sql = "SELECT 1 FROM t WHERE (c->>'k')::BIGINT = $1 AND d = $12 AND e = '$3'";
        assert_eq!(count_placeholders(sql, PlaceholderStyle::Dollar), 2);
    }
}
