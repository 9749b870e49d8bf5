//! # sqlscope
//!
//! Dialect-aware SQL for multi-tenant, soft-deleting schemas.
//!
//! ## Features
//!
//! - **One query, one round trip**: list queries carry their own `total_count` and
//!   `filtered_count` as correlated subqueries
//! - **Scoped by default**: archived rows are hidden and non-admin callers only see rows
//!   they own
//! - **Bound, never interpolated**: every value is a placeholder, including JSON lookups
//! - **Three dialects**: MariaDB/MySQL and SQLite (`?`), Postgres (`$1, $2, ...`)
//! - **Checked output**: every statement's placeholder count is verified against its args
//!
//! ## List queries
//!
//! ```
//! use sqlscope::{Dialect, Filter, QueryBuilder, Table};
//!
//! const ITEMS: Table = Table::new("items")
//!     .with_ownership_column("belongs_to_account")
//!     .with_columns(&["id", "name"]);
//!
//! let qb = QueryBuilder::new(Dialect::Postgres);
//! let req = ITEMS
//!     .list_request()
//!     .requester_id(42)
//!     .filter(Some(Filter::builder().page(2).created_after(1_600_000_000u64).build()?))
//!     .build()?;
//!
//! let q = qb.build_list_query(&req)?;
//! assert!(q.sql.starts_with("SELECT items.id, items.name, (SELECT COUNT(items.id) FROM items"));
//! assert!(q.sql.ends_with("GROUP BY items.id LIMIT 20 OFFSET 20"));
//! assert_eq!(q.args.len(), 5);
//! # Ok::<(), sqlscope::QbError>(())
//! ```

pub mod audit;
pub mod config;
pub mod count;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod ident;
pub mod list;
pub mod predicate;
pub mod prelude;
pub mod query_builder;
pub mod scoped;
pub mod sql;
pub mod value;

pub use audit::{build_audit_entries_query, build_audit_predicate};
pub use config::QbConfig;
pub use count::{filtered_count_subquery, total_count_subquery};
pub use dialect::{Dialect, PlaceholderStyle, count_placeholders};
pub use error::{QbError, QbResult};
pub use filter::{
    DEFAULT_LIMIT, Filter, FilterBuilder, FilterParams, MAX_LIMIT, SortDirection, UnixTime,
};
pub use ident::Ident;
pub use list::{GeneratedQuery, ListQueryRequest, ListQueryRequestBuilder, build_list_query};
pub use predicate::{Predicate, Predicates, build_predicates};
pub use query_builder::QueryBuilder;
pub use scoped::{
    Owner, Table, build_all_count_query, build_archive_query, build_batch_query,
    build_exists_query, build_get_query,
};
pub use sql::{Sql, sql};
pub use value::Value;
