//! Error types for the Docker adapter.

use swarm_registrator_core::ServiceId;
use thiserror::Error;

/// Errors that can occur while talking to the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The service no longer exists, usually because it was removed right
    /// after the event was emitted.
    #[error("service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// An event from the feed could not be decoded.
    #[error("malformed event: {0}")]
    EventDecode(String),

    /// The Engine API answered with an error status.
    #[error("Docker API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the daemon.
        message: String,
    },

    /// A response body did not have the expected shape.
    #[error("invalid Docker API response: {0}")]
    InvalidResponse(String),

    /// The daemon could not be reached or the connection dropped.
    #[error("Docker transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = OrchestratorError::Api {
            status: 503,
            message: "node is not part of a swarm".into(),
        };
        assert_eq!(err.to_string(), "Docker API returned 503: node is not part of a swarm");
        assert_eq!(
            OrchestratorError::ServiceNotFound(ServiceId::from("x")).to_string(),
            "service not found: x"
        );
    }
}
