//! Pagination and time-range filter for list queries.
//!
//! A [`Filter`] is built once at the edge of the system (usually from query-string
//! parameters via [`FilterParams`]) and is never modified by the builders. All invariants
//! (`page >= 1`, `1 <= limit <= MAX_LIMIT`) are enforced when it is constructed.

use crate::error::{QbError, QbResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page size used when the request does not specify one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page size a filter may request. Larger values are clamped.
pub const MAX_LIMIT: u32 = 250;

/// Sort direction applied to `created_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

impl SortDirection {
    pub(crate) fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A Unix timestamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnixTime(pub u64);

impl From<u64> for UnixTime {
    fn from(secs: u64) -> Self {
        UnixTime(secs)
    }
}

impl From<DateTime<Utc>> for UnixTime {
    /// Times before the epoch saturate to `0`.
    fn from(dt: DateTime<Utc>) -> Self {
        UnixTime(u64::try_from(dt.timestamp()).unwrap_or(0))
    }
}

/// A validated request for one page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FilterParams", into = "FilterParams")]
pub struct Filter {
    page: u64,
    limit: u32,
    created_after: Option<u64>,
    created_before: Option<u64>,
    updated_after: Option<u64>,
    updated_before: Option<u64>,
    include_archived: bool,
    sort_by: Option<SortDirection>,
}

impl Default for Filter {
    /// Page 1, [`DEFAULT_LIMIT`] rows, no time bounds.
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            include_archived: false,
            sort_by: None,
        }
    }
}

impl Filter {
    /// Start building a filter.
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Page size, always in `1..=MAX_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * u64::from(self.limit)
    }

    pub fn created_after(&self) -> Option<u64> {
        self.created_after
    }

    pub fn created_before(&self) -> Option<u64> {
        self.created_before
    }

    pub fn updated_after(&self) -> Option<u64> {
        self.updated_after
    }

    pub fn updated_before(&self) -> Option<u64> {
        self.updated_before
    }

    /// Whether archived rows are requested. Only honored for admin listings.
    pub fn include_archived(&self) -> bool {
        self.include_archived
    }

    pub fn sort_by(&self) -> Option<SortDirection> {
        self.sort_by
    }

    /// Whether any of the four time bounds is set.
    pub fn has_time_bounds(&self) -> bool {
        self.created_after.is_some()
            || self.created_before.is_some()
            || self.updated_after.is_some()
            || self.updated_before.is_some()
    }
}

/// Builder for [`Filter`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    page: Option<u64>,
    limit: Option<u32>,
    max_limit: Option<u32>,
    created_after: Option<u64>,
    created_before: Option<u64>,
    updated_after: Option<u64>,
    updated_before: Option<u64>,
    include_archived: bool,
    sort_by: Option<SortDirection>,
}

impl FilterBuilder {
    /// Set the 1-based page. `0` is rejected by [`FilterBuilder::build`].
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size. `0` is rejected, values above the maximum are clamped.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Override the clamp ceiling (defaults to [`MAX_LIMIT`]).
    pub fn max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    pub fn created_after(mut self, t: impl Into<UnixTime>) -> Self {
        self.created_after = Some(t.into().0);
        self
    }

    pub fn created_before(mut self, t: impl Into<UnixTime>) -> Self {
        self.created_before = Some(t.into().0);
        self
    }

    pub fn updated_after(mut self, t: impl Into<UnixTime>) -> Self {
        self.updated_after = Some(t.into().0);
        self
    }

    pub fn updated_before(mut self, t: impl Into<UnixTime>) -> Self {
        self.updated_before = Some(t.into().0);
        self
    }

    pub fn include_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }

    pub fn sort_by(mut self, dir: SortDirection) -> Self {
        self.sort_by = Some(dir);
        self
    }

    /// Validate and build the filter.
    pub fn build(self) -> QbResult<Filter> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(QbError::invalid_request("page must be >= 1"));
        }

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(QbError::invalid_request("limit must be >= 1"));
        }

        let max_limit = self.max_limit.unwrap_or(MAX_LIMIT).max(1);
        let limit = if limit > max_limit {
            tracing::debug!(
                target: "sqlscope.filter",
                requested = limit,
                max = max_limit,
                "clamping filter limit"
            );
            max_limit
        } else {
            limit
        };

        // OFFSET is a signed 64-bit value in every supported engine
        let offset_fits = (page - 1)
            .checked_mul(u64::from(limit))
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !offset_fits {
            return Err(QbError::invalid_request(format!(
                "page {page} with limit {limit} is out of range"
            )));
        }

        Ok(Filter {
            page,
            limit,
            created_after: self.created_after,
            created_before: self.created_before,
            updated_after: self.updated_after,
            updated_before: self.updated_before,
            include_archived: self.include_archived,
            sort_by: self.sort_by,
        })
    }
}

/// Raw, all-optional filter parameters as they arrive in a request.
///
/// ```
/// use sqlscope::{Filter, FilterParams};
///
/// let params = FilterParams { page: Some(3), ..Default::default() };
/// let filter = Filter::try_from(params)?;
/// assert_eq!(filter.offset(), 40);
/// # Ok::<(), sqlscope::QbError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub page: Option<u64>,
    pub limit: Option<u32>,
    pub created_after: Option<u64>,
    pub created_before: Option<u64>,
    pub updated_after: Option<u64>,
    pub updated_before: Option<u64>,
    pub include_archived: Option<bool>,
    pub sort_by: Option<SortDirection>,
}

impl FilterParams {
    /// Convert into a [`Filter`] using the given default and maximum page sizes.
    pub fn into_filter(self, default_limit: u32, max_limit: u32) -> QbResult<Filter> {
        let mut builder = Filter::builder()
            .page(self.page.unwrap_or(1))
            .limit(self.limit.unwrap_or(default_limit))
            .max_limit(max_limit)
            .include_archived(self.include_archived.unwrap_or(false));

        if let Some(t) = self.created_after {
            builder = builder.created_after(t);
        }
        if let Some(t) = self.created_before {
            builder = builder.created_before(t);
        }
        if let Some(t) = self.updated_after {
            builder = builder.updated_after(t);
        }
        if let Some(t) = self.updated_before {
            builder = builder.updated_before(t);
        }
        if let Some(dir) = self.sort_by {
            builder = builder.sort_by(dir);
        }
        builder.build()
    }
}

impl TryFrom<FilterParams> for Filter {
    type Error = QbError;

    fn try_from(params: FilterParams) -> QbResult<Self> {
        params.into_filter(DEFAULT_LIMIT, MAX_LIMIT)
    }
}

impl From<Filter> for FilterParams {
    fn from(f: Filter) -> Self {
        Self {
            page: Some(f.page),
            limit: Some(f.limit),
            created_after: f.created_after,
            created_before: f.created_before,
            updated_after: f.updated_after,
            updated_before: f.updated_before,
            include_archived: Some(f.include_archived),
            sort_by: f.sort_by,
        }
    }
}
