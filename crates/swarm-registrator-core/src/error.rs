//! Common error types for swarm-registrator.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building core values from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A service name cannot be used as a registry key segment.
    #[error("invalid service name {name:?}: {reason}")]
    InvalidServiceName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A service identifier was empty.
    #[error("service identifier must not be empty")]
    EmptyServiceId,
}
