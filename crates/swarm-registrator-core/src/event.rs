//! Service lifecycle events as seen by the reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ServiceId, ServiceName};

/// What happened to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A service was created.
    ServiceCreated,
    /// A service definition changed.
    ServiceUpdated,
    /// A service was removed.
    ServiceRemoved,
    /// Anything else, including events about non-service objects.
    Other,
}

impl EventKind {
    /// Map a Docker service event action to a kind.
    ///
    /// Unknown actions map to [`EventKind::Other`].
    #[must_use]
    pub fn from_action(action: &str) -> Self {
        match action {
            "create" => Self::ServiceCreated,
            "update" => Self::ServiceUpdated,
            "remove" => Self::ServiceRemoved,
            _ => Self::Other,
        }
    }

    /// The action name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceCreated => "create",
            Self::ServiceUpdated => "update",
            Self::ServiceRemoved => "remove",
            Self::Other => "other",
        }
    }

    /// Check if this kind requires inspecting the service and upserting records.
    #[must_use]
    pub const fn is_upsert(&self) -> bool {
        matches!(self, Self::ServiceCreated | Self::ServiceUpdated)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded notification from the orchestrator's event feed.
///
/// Events are consumed once, in receipt order, and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened.
    pub kind: EventKind,
    /// The affected service's identifier.
    pub service_id: ServiceId,
    /// The affected service's name.
    pub service_name: ServiceName,
    /// When the orchestrator emitted the event, if it said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl LifecycleEvent {
    /// Create an event without a timestamp.
    #[must_use]
    pub fn new(
        kind: EventKind,
        service_id: impl Into<ServiceId>,
        service_name: impl Into<ServiceName>,
    ) -> Self {
        Self {
            kind,
            service_id: service_id.into(),
            service_name: service_name.into(),
            time: None,
        }
    }

    /// Shorthand for a `ServiceCreated` event.
    #[must_use]
    pub fn created(service_id: impl Into<ServiceId>, service_name: impl Into<ServiceName>) -> Self {
        Self::new(EventKind::ServiceCreated, service_id, service_name)
    }

    /// Shorthand for a `ServiceUpdated` event.
    #[must_use]
    pub fn updated(service_id: impl Into<ServiceId>, service_name: impl Into<ServiceName>) -> Self {
        Self::new(EventKind::ServiceUpdated, service_id, service_name)
    }

    /// Shorthand for a `ServiceRemoved` event.
    #[must_use]
    pub fn removed(service_id: impl Into<ServiceId>, service_name: impl Into<ServiceName>) -> Self {
        Self::new(EventKind::ServiceRemoved, service_id, service_name)
    }
}
