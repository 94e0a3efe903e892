//! A mock orchestrator for testing without a Docker daemon.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use swarm_registrator_core::{LifecycleEvent, ServiceDescriptor, ServiceId};

use crate::error::{OrchestratorError, Result};
use crate::{EventStream, Orchestrator};

/// An orchestrator that serves services and events from memory.
#[derive(Default)]
pub struct MockOrchestrator {
    services: Mutex<HashMap<ServiceId, ServiceDescriptor>>,
    events: Mutex<Vec<Result<LifecycleEvent>>>,
    inspections: Mutex<Vec<ServiceId>>,
    keep_open: Mutex<bool>,
    unavailable: Mutex<bool>,
}

impl MockOrchestrator {
    /// Create a new mock orchestrator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a service.
    pub fn set_service(&self, service_id: impl Into<ServiceId>, descriptor: ServiceDescriptor) {
        self.services.lock().insert(service_id.into(), descriptor);
    }

    /// Queue an event for the next [`Orchestrator::events`] call.
    pub fn push_event(&self, event: LifecycleEvent) {
        self.events.lock().push(Ok(event));
    }

    /// Queue a feed error for the next [`Orchestrator::events`] call.
    pub fn push_error(&self, error: OrchestratorError) {
        self.events.lock().push(Err(error));
    }

    /// Keep the event stream open after the queued events, like an idle feed.
    pub fn keep_open(&self, keep_open: bool) {
        *self.keep_open.lock() = keep_open;
    }

    /// Make inspection calls fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Service IDs inspected so far, in order.
    #[must_use]
    pub fn inspections(&self) -> Vec<ServiceId> {
        self.inspections.lock().clone()
    }
}

#[async_trait]
impl Orchestrator for MockOrchestrator {
    async fn events(&self) -> Result<EventStream> {
        let queued: Vec<_> = self.events.lock().drain(..).collect();
        let feed = stream::iter(queued);

        if *self.keep_open.lock() {
            Ok(feed.chain(stream::pending()).boxed())
        } else {
            Ok(feed.boxed())
        }
    }

    async fn inspect_service(&self, service_id: &ServiceId) -> Result<ServiceDescriptor> {
        self.inspections.lock().push(service_id.clone());

        if *self.unavailable.lock() {
            return Err(OrchestratorError::Transport(
                "mock orchestrator unavailable".to_string(),
            ));
        }

        self.services
            .lock()
            .get(service_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::ServiceNotFound(service_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_registrator_core::EndpointBinding;

    #[tokio::test]
    async fn inspect_known_and_unknown() {
        let mock = MockOrchestrator::new();
        mock.set_service(
            "s1",
            ServiceDescriptor::new("web", vec![EndpointBinding::published(80, 8080)]),
        );

        let service = mock.inspect_service(&ServiceId::from("s1")).await.unwrap();
        assert_eq!(service.service_name.as_str(), "web");

        let err = mock
            .inspect_service(&ServiceId::from("s2"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ServiceNotFound(_)));
        assert_eq!(mock.inspections().len(), 2);
    }

    #[tokio::test]
    async fn events_drain_queue() {
        let mock = MockOrchestrator::new();
        mock.push_event(LifecycleEvent::created("s1", "web"));
        mock.push_error(OrchestratorError::EventDecode("bad".into()));

        let events: Vec<_> = mock.events().await.unwrap().collect().await;
        assert_eq!(events.len(), 2);

        let events: Vec<_> = mock.events().await.unwrap().collect().await;
        assert!(events.is_empty());
    }
}
