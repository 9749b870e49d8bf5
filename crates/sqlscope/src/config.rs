//! Builder configuration.
//!
//! ```toml
//! dialect = "mariadb"
//! default_limit = 20
//! max_limit = 250
//! log_sql_max_len = 200
//! ```
//!
//! Only `dialect` is required.

use crate::dialect::Dialect;
use crate::error::{QbError, QbResult};
use crate::filter::{DEFAULT_LIMIT, MAX_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest SQL text (in bytes) written to a log event before it is cut.
pub const DEFAULT_LOG_SQL_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QbConfig {
    pub dialect: Dialect,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "max_limit")]
    pub max_limit: u32,
    #[serde(default = "log_sql_max_len")]
    pub log_sql_max_len: usize,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn max_limit() -> u32 {
    MAX_LIMIT
}

fn log_sql_max_len() -> usize {
    DEFAULT_LOG_SQL_MAX_LEN
}

impl QbConfig {
    /// Defaults for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            log_sql_max_len: DEFAULT_LOG_SQL_MAX_LEN,
        }
    }

    pub fn from_toml_str(raw: &str) -> QbResult<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| QbError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> QbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            QbError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            QbError::Config(msg) => QbError::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn validate(&self) -> QbResult<()> {
        if self.default_limit == 0 {
            return Err(QbError::config("default_limit must be > 0"));
        }
        if self.max_limit < self.default_limit {
            return Err(QbError::config(format!(
                "max_limit ({}) must be >= default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        Ok(())
    }
}
