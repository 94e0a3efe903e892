//! Mirrors Docker Swarm service endpoints into the Consul key-value store.
//!
//! The [`Reconciler`] consumes the orchestrator's service lifecycle events one
//! at a time and keeps two registration records per service up to date:
//!
//! - `swarm-registrator/v1/http/<name>`: the service's base settings from
//!   `appsettings/v1/<name>`, with `swarm_port` set to the published HTTP port
//! - `swarm-registrator/v1/tcp/<name>`: a list of `{"<published>": <target>}`
//!   pairs for every other published endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  events   ┌──────────────────┐  get/put/delete  ┌────────┐
//! │  Docker Engine   │──────────▶│    Reconciler    │─────────────────▶│ Consul │
//! │ (Orchestrator)   │◀──────────│ classify + merge │                  │  (KV)  │
//! └──────────────────┘  inspect  └──────────────────┘                  └────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use swarm_registrator::Reconciler;
//! use swarm_registrator_docker::{DockerClient, DockerHost, Orchestrator};
//! use swarm_registrator_store::{ConsulAddress, ConsulStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeout = Duration::from_secs(10);
//! let store = Arc::new(ConsulStore::new(&ConsulAddress::default(), timeout)?);
//! let docker = Arc::new(DockerClient::new(&DockerHost::default(), timeout)?);
//!
//! let events = docker.events().await?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! Reconciler::new(store, docker).run(events, shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod reconciler;

pub use config::{RegistratorConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{ConfigError, ReconcileError, RegistryOp, RunError};
pub use reconciler::{Outcome, Reconciler, SkipReason};
