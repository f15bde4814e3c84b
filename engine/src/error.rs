//! Error types for the casebook engine.

use thiserror::Error;

/// All possible errors from the casebook engine.
///
/// Only failures that affect data integrity surface here. Dropped writes and
/// failed match lookups are logged and degrade to absent/empty results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Construction errors
    #[error("malformed record JSON: {0}")]
    Parse(String),

    #[error("record JSON must be an object, got {0}")]
    NotAnObject(String),

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("field '{field}' must be an array, got {found}")]
    NotAnArray { field: String, found: String },

    // Reconciliation errors
    #[error("invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("invalid history entry: {0}")]
    InvalidHistory(String),

    // Collaborator errors
    #[error("lookup failed: {0}")]
    Lookup(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
