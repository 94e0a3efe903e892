//! Consul key-value storage layer for swarm-registrator.
//!
//! This crate provides the [`KvStore`] abstraction over a hierarchical
//! key-value registry, its Consul HTTP implementation, and the
//! [`RegistryWriter`] that maps service registrations onto keys.
//!
//! # Key layout
//!
//! - `appsettings/v1/<service>`: base settings, read only
//! - `swarm-registrator/v1/http/<service>`: HTTP registration (JSON object)
//! - `swarm-registrator/v1/tcp/<service>`: TCP registration (JSON list)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use swarm_registrator_core::{AppSettings, ServiceName};
//! use swarm_registrator_store::{ConsulAddress, ConsulStore, RegistryWriter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let address = ConsulAddress::parse_or_default(Some("consul://localhost:8500"))?;
//! let store = Arc::new(ConsulStore::new(&address, Duration::from_secs(10))?);
//! let registry = RegistryWriter::new(store);
//!
//! let name = ServiceName::from("web");
//! let base = registry.read_base_settings(&name).await?;
//! registry.write_http(&name, &base).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod address;
pub mod consul;
pub mod error;
pub mod keys;
pub mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use address::ConsulAddress;
pub use consul::ConsulStore;
pub use error::{Result, StoreError};
pub use registry::RegistryWriter;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::{KvCall, MemoryStore};

use async_trait::async_trait;

/// The key-value operations the registrator needs.
///
/// This trait abstracts the registry backend, allowing for different
/// implementations (Consul over HTTP, in-memory for testing).
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the raw value stored at `key`.
    ///
    /// Returns `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` at `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the write.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. With `recursive`, every key sharing the `key` prefix is
    /// removed as well.
    ///
    /// Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or rejects the delete.
    async fn delete(&self, key: &str, recursive: bool) -> Result<()>;
}
