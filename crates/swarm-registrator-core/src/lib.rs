//! Core types and pure reconciliation logic for swarm-registrator.
//!
//! This crate provides the foundational types shared by the store, the Docker
//! adapter and the reconciler:
//!
//! - **Identifiers**: [`ServiceId`] and [`ServiceName`]
//! - **Events**: [`LifecycleEvent`] and [`EventKind`]
//! - **Service descriptions**: [`ServiceDescriptor`] and [`EndpointBinding`]
//! - **Settings**: [`AppSettings`] and the [`settings::merge`] step
//! - **Port classification**: [`ports::classify`]
//!
//! # Example
//!
//! ```
//! use swarm_registrator_core::{classify, merge, AppSettings, EndpointBinding};
//!
//! let endpoints = vec![
//!     EndpointBinding::published(9000, 31000),
//!     EndpointBinding::published(22, 31022),
//! ];
//! let base = AppSettings::with_http_port(9000);
//!
//! let ports = classify(&endpoints, &base);
//! assert_eq!(ports.http_port, Some(31000));
//! assert_eq!(ports.tcp_ports.len(), 1);
//!
//! let record = merge(base, ports.http_port);
//! assert_eq!(record.swarm_port(), Some("31000"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod event;
pub mod ids;
pub mod ports;
pub mod service;
pub mod settings;

pub use error::{CoreError, Result};
pub use event::{EventKind, LifecycleEvent};
pub use ids::{ServiceId, ServiceName};
pub use ports::{classify, HttpTarget, PortClassification, TcpPortMapping};
pub use service::{EndpointBinding, Protocol, ServiceDescriptor};
pub use settings::{merge, AppSettings, HttpPortSetting};
