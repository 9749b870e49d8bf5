//! Error types for sqlscope

use thiserror::Error;

/// Result type alias for sqlscope operations
pub type QbResult<T> = Result<T, QbError>;

/// Error types for query construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QbError {
    /// The caller broke the request contract (bad identifier, zero limit, unscoped request...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The builder produced an inconsistent statement. This is a bug in sqlscope.
    #[error("Internal builder error: {0}")]
    InternalBuilder(String),

    /// Configuration could not be read or validated
    #[error("Config error: {0}")]
    Config(String),
}

impl QbError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an internal builder error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalBuilder(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a caller-contract violation
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Check if this is an internal builder error
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalBuilder(_))
    }

    /// A message safe to show to end users.
    ///
    /// Never contains SQL fragments or dialect details.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "bad request",
            Self::InternalBuilder(_) | Self::Config(_) => "internal error",
        }
    }
}
