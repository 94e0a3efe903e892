//! Classification of published endpoints into HTTP and auxiliary TCP ports.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::service::EndpointBinding;
use crate::settings::AppSettings;

/// An auxiliary endpoint: published port mapped to target port.
///
/// Serialized as a single-entry object, `{"31022": 22}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TcpPortMapping {
    /// Externally reachable port.
    pub published: u16,
    /// Port inside the cluster.
    pub target: u16,
}

impl TcpPortMapping {
    /// Create a mapping.
    #[must_use]
    pub const fn new(published: u16, target: u16) -> Self {
        Self { published, target }
    }
}

impl fmt::Display for TcpPortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.published, self.target)
    }
}

impl Serialize for TcpPortMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.published, &self.target)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for TcpPortMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<u16, u16>::deserialize(deserializer)?;
        let mut iter = entries.into_iter();
        match (iter.next(), iter.next()) {
            (Some((published, target)), None) => Ok(Self { published, target }),
            _ => Err(de::Error::custom("port mapping must have exactly one entry")),
        }
    }
}

/// Where the HTTP target port came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpTarget {
    /// `http_port` from the base settings.
    Configured(u16),
    /// Fallback: the target port of the first endpoint.
    ///
    /// Orchestrator ordering is not contractually stable, so this is
    /// best-effort for services with several endpoints.
    FirstEndpoint(u16),
}

impl HttpTarget {
    /// The chosen target port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        match self {
            Self::Configured(port) | Self::FirstEndpoint(port) => *port,
        }
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortClassification {
    /// Target port chosen as HTTP, if any endpoint or configuration named one.
    pub http_target: Option<HttpTarget>,
    /// Published port of the primary HTTP endpoint.
    pub http_port: Option<u16>,
    /// Every other published endpoint, in endpoint order.
    pub tcp_ports: Vec<TcpPortMapping>,
}

impl PortClassification {
    /// Check if the HTTP target was guessed from endpoint order among
    /// several endpoints.
    #[must_use]
    pub fn is_ambiguous_fallback(&self, endpoint_count: usize) -> bool {
        matches!(self.http_target, Some(HttpTarget::FirstEndpoint(_))) && endpoint_count > 1
    }
}

/// Separate one primary HTTP endpoint from auxiliary TCP endpoints.
///
/// The HTTP target is `prior.http_port()`, or the first endpoint's target port.
/// The first endpoint on that target with a published port becomes the HTTP
/// port. Endpoints on any other target with a published port become TCP
/// mappings. Endpoints without a published port are ignored.
#[must_use]
pub fn classify(endpoints: &[EndpointBinding], prior: &AppSettings) -> PortClassification {
    let http_target = match prior.http_port() {
        Some(port) => Some(HttpTarget::Configured(port)),
        None => endpoints
            .first()
            .map(|endpoint| HttpTarget::FirstEndpoint(endpoint.target_port)),
    };

    let Some(target) = http_target.map(|t| t.port()) else {
        return PortClassification::default();
    };

    let mut http_port = None;
    let mut tcp_ports = Vec::new();

    for endpoint in endpoints {
        let Some(published) = endpoint.published_port else {
            continue;
        };

        if endpoint.target_port == target {
            http_port.get_or_insert(published);
        } else {
            tcp_ports.push(TcpPortMapping::new(published, endpoint.target_port));
        }
    }

    PortClassification {
        http_target,
        http_port,
        tcp_ports,
    }
}
