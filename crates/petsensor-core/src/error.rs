//! Error types for the petsensor system
//!
//! This module defines all error types used throughout the crate.
//!
//! Only two kinds ever escape the public sensor operations:
//! [`Error::ConfigUnavailable`] (construction) and [`Error::NoDataAvailable`]
//! (neither a live call nor the cache produced a payload). Everything else is
//! absorbed by the fallback path and logged.

use thiserror::Error;

/// Result type alias for petsensor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the petsensor system
#[derive(Error, Debug)]
pub enum Error {
    /// Settings could not be loaded or are invalid; the sensor cannot start
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// The transport could not complete the request (connection, timeout)
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The upstream response was not usable structured data
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Neither a live call nor the record cache produced a payload
    #[error("No data available: {0}")]
    NoDataAvailable(String),

    /// A single upstream item is missing a required field
    #[error("Record {index} is missing required field '{field}'")]
    RecordShape {
        /// Position of the item in the upstream list
        index: usize,
        /// Name of the missing upstream field
        field: &'static str,
    },

    /// Document not present in the store
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document store failures other than "not found"
    #[error("Store error: {0}")]
    Store(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration-unavailable error
    pub fn config_unavailable(msg: impl Into<String>) -> Self {
        Self::ConfigUnavailable(msg.into())
    }

    /// Create a transport failure
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a no-data-available error
    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoDataAvailable(msg.into())
    }

    /// Create a record shape error for the item at `index`
    pub fn record_shape(index: usize, field: &'static str) -> Self {
        Self::RecordShape { index, field }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether the error must be surfaced to the caller instead of
    /// degrading to cached data
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigUnavailable(_) | Self::NoDataAvailable(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
