//! Parsing of `GET /services/{id}` responses.

use serde::Deserialize;

use swarm_registrator_core::{EndpointBinding, Protocol, ServiceDescriptor, ServiceName};

use crate::error::{OrchestratorError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawService {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(default)]
    spec: RawSpec,
    #[serde(default)]
    endpoint: RawEndpoint,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSpec {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawEndpoint {
    #[serde(default)]
    ports: Option<Vec<RawPort>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPort {
    #[serde(default)]
    protocol: Option<String>,
    target_port: u16,
    #[serde(default)]
    published_port: Option<u16>,
}

impl From<RawPort> for EndpointBinding {
    fn from(port: RawPort) -> Self {
        Self {
            target_port: port.target_port,
            // The daemon reports 0 for ports it has not assigned yet.
            published_port: port.published_port.filter(|p| *p != 0),
            protocol: port
                .protocol
                .as_deref()
                .map(Protocol::from_docker)
                .unwrap_or_default(),
        }
    }
}

/// Parse a service inspection body into a descriptor.
///
/// Missing `Endpoint` or `Endpoint.Ports` yields an empty endpoint list; port
/// order is preserved.
///
/// # Errors
///
/// Returns `OrchestratorError::InvalidResponse` if the body is not a service
/// object or a port entry lacks `TargetPort`.
pub fn parse_service(body: &[u8]) -> Result<ServiceDescriptor> {
    let raw: RawService = serde_json::from_slice(body)
        .map_err(|e| OrchestratorError::InvalidResponse(format!("service inspect: {e}")))?;

    if raw.spec.name.is_empty() {
        return Err(OrchestratorError::InvalidResponse(format!(
            "service {} has no Spec.Name",
            raw.id
        )));
    }

    let endpoints = raw
        .endpoint
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(EndpointBinding::from)
        .collect();

    Ok(ServiceDescriptor {
        service_name: ServiceName::new(raw.spec.name),
        endpoints,
    })
}
