//! Service descriptions fetched from the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ServiceName;

/// Transport protocol of an endpoint binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP (Docker's default).
    #[default]
    Tcp,
    /// UDP.
    Udp,
    /// SCTP.
    Sctp,
}

impl Protocol {
    /// Parse a Docker protocol string, falling back to TCP.
    #[must_use]
    pub fn from_docker(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "udp" => Self::Udp,
            "sctp" => Self::Sctp,
            _ => Self::Tcp,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Sctp => "sctp",
        })
    }
}

/// A single network endpoint of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointBinding {
    /// Port the service listens on inside the cluster.
    pub target_port: u16,
    /// Externally reachable port, absent until the orchestrator assigns one.
    pub published_port: Option<u16>,
    /// Transport protocol.
    #[serde(default)]
    pub protocol: Protocol,
}

impl EndpointBinding {
    /// A TCP binding with a published port.
    #[must_use]
    pub const fn published(target_port: u16, published_port: u16) -> Self {
        Self {
            target_port,
            published_port: Some(published_port),
            protocol: Protocol::Tcp,
        }
    }

    /// A TCP binding that has not been published.
    #[must_use]
    pub const fn unpublished(target_port: u16) -> Self {
        Self {
            target_port,
            published_port: None,
            protocol: Protocol::Tcp,
        }
    }

    /// Return the same binding with a different protocol.
    #[must_use]
    pub const fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }
}

/// The current shape of a service, as far as registration is concerned.
///
/// Transient: lives only for the processing of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// The service name.
    pub service_name: ServiceName,
    /// Endpoint bindings in the order the orchestrator returned them.
    pub endpoints: Vec<EndpointBinding>,
}

impl ServiceDescriptor {
    /// Create a descriptor.
    #[must_use]
    pub fn new(service_name: impl Into<ServiceName>, endpoints: Vec<EndpointBinding>) -> Self {
        Self {
            service_name: service_name.into(),
            endpoints,
        }
    }

    /// Check if the service exposes no endpoints at all.
    #[must_use]
    pub fn has_no_endpoints(&self) -> bool {
        self.endpoints.is_empty()
    }
}
