//! Docker Swarm event feed and service inspection for swarm-registrator.
//!
//! This crate provides the [`Orchestrator`] trait and the [`DockerClient`]
//! implementation. It handles:
//!
//! - Reaching the Engine API over its Unix socket or over TCP
//! - Subscribing to the event feed, filtered to service events
//! - Decoding newline-delimited events into [`LifecycleEvent`]s
//! - Inspecting a service to read its endpoint port bindings
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use futures::StreamExt;
//! use swarm_registrator_docker::{DockerClient, DockerHost, Orchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let docker = DockerClient::new(&DockerHost::default(), Duration::from_secs(10))?;
//! let mut events = docker.events().await?;
//!
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     let service = docker.inspect_service(&event.service_id).await?;
//!     println!("{} has {} endpoints", service.service_name, service.endpoints.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature to get [`MockOrchestrator`], which serves
//! queued events and registered services from memory.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod events;
pub mod host;
pub mod service;
#[cfg(unix)]
mod unix;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use client::DockerClient;
pub use error::{OrchestratorError, Result};
pub use events::{decode_event, decode_lines, MAX_LINE_BYTES};
pub use host::{DockerHost, DEFAULT_DOCKER_HOST};
pub use service::parse_service;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockOrchestrator;

use async_trait::async_trait;
use futures::stream::BoxStream;

use swarm_registrator_core::{LifecycleEvent, ServiceDescriptor, ServiceId};

/// A long-lived feed of decoded lifecycle events.
///
/// May stay silent indefinitely between items. Ends only when the connection
/// to the orchestrator is lost.
pub type EventStream = BoxStream<'static, Result<LifecycleEvent>>;

/// The orchestrator operations the registrator needs.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Subscribe to service lifecycle events.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    async fn events(&self) -> Result<EventStream>;

    /// Fetch the current description of a service.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::ServiceNotFound` if the service no longer
    /// exists, or another error if the call fails.
    async fn inspect_service(&self, service_id: &ServiceId) -> Result<ServiceDescriptor>;
}
