//! Error types for the reconciler.

use std::fmt;

use swarm_registrator_core::ServiceName;
use swarm_registrator_docker::OrchestratorError;
use swarm_registrator_store::StoreError;
use thiserror::Error;

/// The registry operation that was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    /// Reading `appsettings/v1/<name>`.
    ReadBaseSettings,
    /// Writing the HTTP record.
    WriteHttp,
    /// Deleting the HTTP record.
    DeleteHttp,
    /// Writing the TCP record.
    WriteTcp,
    /// Deleting the TCP record.
    DeleteTcp,
}

impl RegistryOp {
    /// Short name used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadBaseSettings => "read_base_settings",
            Self::WriteHttp => "write_http",
            Self::DeleteHttp => "delete_http",
            Self::WriteTcp => "write_tcp",
            Self::DeleteTcp => "delete_tcp",
        }
    }
}

impl fmt::Display for RegistryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to reconcile one event.
///
/// The run loop logs these and moves on to the next event.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A registry read or write failed.
    #[error("{op} failed for service {service}: {source}")]
    Registry {
        /// The service being reconciled.
        service: ServiceName,
        /// The operation that failed.
        op: RegistryOp,
        /// The store error.
        #[source]
        source: StoreError,
    },

    /// Inspecting the service failed for a reason other than it being gone.
    #[error("inspecting service {service} failed: {source}")]
    Orchestrator {
        /// The service being reconciled.
        service: ServiceName,
        /// The orchestrator error.
        #[source]
        source: OrchestratorError,
    },
}

impl ReconcileError {
    /// The service the failed event was about.
    #[must_use]
    pub const fn service(&self) -> &ServiceName {
        match self {
            Self::Registry { service, .. } | Self::Orchestrator { service, .. } => service,
        }
    }

    pub(crate) fn registry(service: &ServiceName, op: RegistryOp, source: StoreError) -> Self {
        Self::Registry {
            service: service.clone(),
            op,
            source,
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The Consul address could not be parsed.
    #[error(transparent)]
    Consul(#[from] StoreError),

    /// The Docker host could not be used.
    #[error(transparent)]
    Docker(#[from] OrchestratorError),

    /// The request timeout is zero.
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Reasons the run loop stops with an error.
#[derive(Debug, Error)]
pub enum RunError {
    /// The event feed ended, usually because the daemon connection closed.
    #[error("event stream ended")]
    StreamEnded,

    /// The event feed failed.
    #[error("event stream failed: {0}")]
    Stream(#[source] OrchestratorError),
}
