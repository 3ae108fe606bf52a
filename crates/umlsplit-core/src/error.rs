//! Error taxonomy for graph lookups, metrics and view strategies

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A node-by-name lookup matched nothing.
    #[error("class not found: {0}")]
    NodeNotFound(String),

    #[error("unknown metric: {0}")]
    InvalidMetric(String),

    #[error("unknown view strategy: {0}")]
    InvalidStrategy(String),

    #[error("unknown traversal direction: {0}")]
    InvalidDirection(String),

    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
