//! Docker Engine API client.
//!
//! The daemon is reached over its Unix socket by default, or over TCP (for
//! example a manager node started with `-H tcp://0.0.0.0:2375`, or a socket
//! proxy).

#[cfg(unix)]
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info};

use swarm_registrator_core::{ServiceDescriptor, ServiceId};

use crate::error::{OrchestratorError, Result};
use crate::events::{decode_lines, SERVICE_EVENT_TYPE};
use crate::host::DockerHost;
use crate::service::parse_service;
use crate::{EventStream, Orchestrator};

#[derive(Debug, Clone)]
enum Transport {
    Http {
        client: reqwest::Client,
        base_url: String,
    },
    #[cfg(unix)]
    Unix(PathBuf),
}

/// Status and body of an Engine API response, independent of transport.
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) chunks: BoxStream<'static, Result<Bytes>>,
}

impl Reply {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    async fn body(self) -> Result<Vec<u8>> {
        self.chunks
            .try_fold(Vec::new(), |mut body, chunk| async move {
                body.extend_from_slice(&chunk);
                Ok(body)
            })
            .await
    }

    async fn into_api_error(self) -> OrchestratorError {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let status = self.status;
        let body = self.body().await.unwrap_or_default();
        let body = String::from_utf8_lossy(&body).into_owned();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        OrchestratorError::Api { status, message }
    }
}

/// Orchestrator backed by the Docker Engine HTTP API.
#[derive(Debug, Clone)]
pub struct DockerClient {
    transport: Transport,
    request_timeout: Duration,
}

impl DockerClient {
    /// Create a client for the given Engine API address.
    ///
    /// `request_timeout` applies to inspection calls only; the event feed is
    /// a long-lived request and has no timeout.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::Config` if the HTTP client cannot be
    /// created.
    pub fn new(host: &DockerHost, request_timeout: Duration) -> Result<Self> {
        let transport = match host {
            DockerHost::Http(base_url) => {
                let client = reqwest::Client::builder()
                    .connect_timeout(Duration::from_secs(5))
                    .build()
                    .map_err(|e| {
                        OrchestratorError::Config(format!("Failed to create HTTP client: {e}"))
                    })?;
                Transport::Http {
                    client,
                    base_url: base_url.clone(),
                }
            }
            #[cfg(unix)]
            DockerHost::Unix(socket) => Transport::Unix(socket.clone()),
        };

        Ok(Self {
            transport,
            request_timeout,
        })
    }

    /// Create a TCP client with a custom reqwest client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport: Transport::Http {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            },
            request_timeout,
        }
    }

    /// Get the Engine API address this client talks to.
    #[must_use]
    pub fn host(&self) -> DockerHost {
        match &self.transport {
            Transport::Http { base_url, .. } => DockerHost::Http(base_url.clone()),
            #[cfg(unix)]
            Transport::Unix(socket) => DockerHost::Unix(socket.clone()),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Reply> {
        match &self.transport {
            Transport::Http { client, base_url } => {
                let response = client
                    .get(format!("{base_url}{path}"))
                    .query(query)
                    .send()
                    .await
                    .map_err(|e| OrchestratorError::Transport(format!("GET {path}: {e}")))?;

                let status = response.status().as_u16();
                let chunks = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(|e| OrchestratorError::Transport(e.to_string())))
                    .boxed();
                Ok(Reply { status, chunks })
            }
            #[cfg(unix)]
            Transport::Unix(socket) => crate::unix::get(socket, &path_and_query(path, query)?).await,
        }
    }

    async fn fetch_service(&self, service_id: &ServiceId) -> Result<Vec<u8>> {
        let path = format!("/services/{service_id}");
        let reply = self.get(&path, &[("insertDefaults", "false")]).await?;

        if reply.status == 404 {
            return Err(OrchestratorError::ServiceNotFound(service_id.clone()));
        }
        if !reply.is_success() {
            return Err(reply.into_api_error().await);
        }
        reply.body().await
    }
}

/// Percent-encode `query` onto `path` for a request line.
#[cfg(unix)]
fn path_and_query(path: &str, query: &[(&str, &str)]) -> Result<String> {
    let url = reqwest::Url::parse_with_params(&format!("http://docker{path}"), query)
        .map_err(|e| OrchestratorError::Config(format!("invalid request path {path}: {e}")))?;

    Ok(match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    })
}

#[async_trait]
impl Orchestrator for DockerClient {
    async fn events(&self) -> Result<EventStream> {
        let filters = serde_json::json!({ "type": [SERVICE_EVENT_TYPE] }).to_string();

        let reply = self.get("/events", &[("filters", filters.as_str())]).await?;
        if !reply.is_success() {
            return Err(reply.into_api_error().await);
        }

        info!(docker_host = %self.host(), "Subscribed to service events");
        Ok(decode_lines(reply.chunks))
    }

    async fn inspect_service(&self, service_id: &ServiceId) -> Result<ServiceDescriptor> {
        let body = tokio::time::timeout(self.request_timeout, self.fetch_service(service_id))
            .await
            .map_err(|_| {
                OrchestratorError::Transport(format!(
                    "inspect {service_id}: no response within {:?}",
                    self.request_timeout
                ))
            })??;

        let descriptor = parse_service(&body)?;
        debug!(
            service_id = %service_id,
            service = %descriptor.service_name,
            endpoints = descriptor.endpoints.len(),
            "Inspected service"
        );
        Ok(descriptor)
    }
}
