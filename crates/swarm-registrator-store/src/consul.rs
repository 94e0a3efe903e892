//! Consul HTTP API implementation of [`KvStore`].

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::address::ConsulAddress;
use crate::error::{Result, StoreError};
use crate::KvStore;

/// One entry of a `GET /v1/kv/<key>` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvEntry {
    key: String,
    /// Base64-encoded value; `null` for keys stored with an empty body.
    value: Option<String>,
}

/// Consul-backed key-value store.
///
/// Talks to the agent's HTTP API; every call is a single request with no
/// retries.
#[derive(Debug, Clone)]
pub struct ConsulStore {
    client: reqwest::Client,
    base_url: String,
}

impl ConsulStore {
    /// Create a store for the given agent address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the HTTP client cannot be built.
    pub fn new(address: &ConsulAddress, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| StoreError::Connection {
                address: address.to_string(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self::with_client(client, address.base_url()))
    }

    /// Create a store with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL of the HTTP API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify the agent is reachable and the cluster has a leader.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the agent does not answer, answers
    /// with an error, or reports no leader.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/v1/status/leader", self.base_url);
        let connection_error = |reason: String| StoreError::Connection {
            address: self.base_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(connection_error(format!("status endpoint returned {status}")));
        }

        let leader: String = response
            .json()
            .await
            .map_err(|e| connection_error(format!("invalid leader response: {e}")))?;

        if leader.is_empty() {
            return Err(connection_error("cluster has no leader".to_string()));
        }

        tracing::debug!(leader = %leader, "Consul leader reachable");
        Ok(())
    }

    fn kv_url(&self, key: &str) -> String {
        format!("{}/v1/kv/{}", self.base_url, key.trim_start_matches('/'))
    }

    async fn rejected(key: &str, response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        StoreError::Rejected {
            key: key.to_string(),
            status,
            message: message.trim().to_string(),
        }
    }

    /// Consul answers writes with a bare `true` or `false`.
    async fn expect_true(key: &str, op: &str, response: reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::rejected(key, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Unavailable(format!("{op} {key}: {e}")))?;

        if body.trim() == "true" {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "{op} {key} was not applied (agent answered {:?})",
                body.trim()
            )))
        }
    }
}

fn transport_error(op: &str, key: &str, e: &reqwest::Error) -> StoreError {
    StoreError::Unavailable(format!("{op} {key}: {e}"))
}

#[async_trait]
impl KvStore for ConsulStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get(self.kv_url(key))
            .send()
            .await
            .map_err(|e| transport_error("get", key, &e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejected(key, response).await);
        }

        let entries: Vec<KvEntry> = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(format!("invalid KV response for {key}: {e}")))?;

        let Some(entry) = entries.into_iter().find(|entry| entry.key == key) else {
            return Ok(None);
        };

        match entry.value {
            None => Ok(Some(Vec::new())),
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("invalid base64 in {key}: {e}"))),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let response = self
            .client
            .put(self.kv_url(key))
            .body(value.to_vec())
            .send()
            .await
            .map_err(|e| transport_error("put", key, &e))?;

        Self::expect_true(key, "put", response).await
    }

    async fn delete(&self, key: &str, recursive: bool) -> Result<()> {
        let mut request = self.client.delete(self.kv_url(key));
        if recursive {
            request = request.query(&[("recurse", "true")]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error("delete", key, &e))?;

        Self::expect_true(key, "delete", response).await
    }
}
