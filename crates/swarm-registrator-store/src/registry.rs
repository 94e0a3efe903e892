//! Registration records on top of a [`KvStore`].
//!
//! Each method is exactly one store call. Nothing is retried here; failures
//! go back to the caller.

use std::sync::Arc;

use swarm_registrator_core::{AppSettings, ServiceName, TcpPortMapping};
use tracing::debug;

use crate::error::Result;
use crate::keys;
use crate::KvStore;

/// Reads base settings and writes or deletes a service's registration records.
pub struct RegistryWriter<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> Clone for RegistryWriter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> RegistryWriter<S> {
    /// Create a writer over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read the base settings at `appsettings/v1/<name>`.
    ///
    /// A missing or empty key yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the stored value is not a JSON
    /// object, or a transport error from the store.
    pub async fn read_base_settings(&self, name: &ServiceName) -> Result<AppSettings> {
        let key = keys::appsettings_key(name);

        match self.store.get(&key).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(AppSettings::from_json(&bytes)?)
            }
            _ => {
                debug!(service = %name, key, "No base settings stored");
                Ok(AppSettings::default())
            }
        }
    }

    /// Store the HTTP registration for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store write fails.
    pub async fn write_http(&self, name: &ServiceName, settings: &AppSettings) -> Result<()> {
        let key = keys::http_key(name);
        let value = settings.to_json()?;
        self.store.put(&key, &value).await?;
        debug!(service = %name, key, "Wrote HTTP registration");
        Ok(())
    }

    /// Remove the HTTP registration for `name`.
    ///
    /// The delete is exact, not recursive: a recursive delete is a prefix
    /// delete in Consul and would also remove `web-admin` when removing `web`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn delete_http(&self, name: &ServiceName) -> Result<()> {
        let key = keys::http_key(name);
        self.store.delete(&key, false).await?;
        debug!(service = %name, key, "Deleted HTTP registration");
        Ok(())
    }

    /// Store the TCP registration for `name`.
    ///
    /// An empty list is written as a delete, so the record is present iff at
    /// least one mapping exists.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the store call fails.
    pub async fn write_tcp(&self, name: &ServiceName, ports: &[TcpPortMapping]) -> Result<()> {
        if ports.is_empty() {
            return self.delete_tcp(name).await;
        }

        let key = keys::tcp_key(name);
        let value = serde_json::to_vec(ports)?;
        self.store.put(&key, &value).await?;
        debug!(service = %name, key, count = ports.len(), "Wrote TCP registration");
        Ok(())
    }

    /// Remove the TCP registration for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn delete_tcp(&self, name: &ServiceName) -> Result<()> {
        let key = keys::tcp_key(name);
        self.store.delete(&key, false).await?;
        debug!(service = %name, key, "Deleted TCP registration");
        Ok(())
    }
}
