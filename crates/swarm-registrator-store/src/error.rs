//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during key-value operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected HTTP status.
    #[error("store returned HTTP {status} for {key}: {message}")]
    Rejected {
        /// The key being operated on.
        key: String,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The connection URL could not be parsed.
    #[error("invalid store address {url:?}: {reason}")]
    InvalidAddress {
        /// The URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The startup connectivity check failed.
    #[error("cannot connect to store at {address}: {reason}")]
    Connection {
        /// The address that was checked.
        address: String,
        /// The underlying failure.
        reason: String,
    },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
