//! Parameter-safe SQL composition.
//!
//! [`Sql`] stores raw SQL pieces and bound values separately. Placeholders are written only
//! when the statement is rendered for a [`Dialect`], so fragments built independently (a
//! count subquery, a WHERE clause) can be spliced together with [`Sql::push_sql`] and the
//! arguments always end up in the order their placeholders appear.
//!
//! # Example
//!
//! ```
//! use sqlscope::{Dialect, Sql};
//!
//! let mut q = Sql::new("SELECT items.id FROM items WHERE items.belongs_to_account = ");
//! q.push_bind(42u64);
//! q.push(" AND items.id = ").push_bind(7u64);
//!
//! assert_eq!(
//!     q.render(Dialect::Postgres),
//!     "SELECT items.id FROM items WHERE items.belongs_to_account = $1 AND items.id = $2"
//! );
//! assert_eq!(q.params().len(), 2);
//! ```

use crate::dialect::Dialect;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL fragment together with its bound values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let mut sql = Self::empty();
        sql.push(&initial_sql.into());
        sql
    }

    /// Create an empty builder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append another fragment, consuming it. Its parameters follow ours.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        for part in other.parts {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param => self.parts.push(SqlPart::Param),
            }
        }
        self.params.extend(other.params);
        self
    }

    /// Append each item with `sep` in between; `f` writes one item.
    pub fn push_separated<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        sep: &str,
        mut f: impl FnMut(&mut Sql, T),
    ) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(sep);
            }
            f(self, item);
        }
        self
    }

    /// Number of placeholders pushed so far.
    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param))
            .count()
    }

    /// Bound values, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Consume the builder, returning its bound values.
    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    /// Render the SQL text with the dialect's placeholders.
    pub fn render(&self, dialect: Dialect) -> String {
        self.render_from(dialect, 1)
    }

    /// Render with numbered placeholders starting at `first_index` instead of 1, for
    /// fragments that will follow already-bound parameters.
    pub fn render_from(&self, dialect: Dialect, first_index: usize) -> String {
        let style = dialect.placeholder_style();
        let mut out = String::new();
        let mut idx = first_index.saturating_sub(1);

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    style.write(&mut out, idx);
                }
            }
        }
        out
    }
}
