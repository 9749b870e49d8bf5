//! Convenient imports for typical `sqlscope` usage.
//!
//! ```
//! use sqlscope::prelude::*;
//! ```

pub use crate::{
    Dialect, Filter, FilterParams, GeneratedQuery, ListQueryRequest, Owner, QbConfig, QbError,
    QbResult, QueryBuilder, SortDirection, Table, Value,
};
