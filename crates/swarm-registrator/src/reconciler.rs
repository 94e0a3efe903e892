//! Event reconciliation.
//!
//! Every event is handled to completion before the next one is pulled from
//! the feed:
//!
//! ```text
//! Received ──► Other ─────────────────────────────► Skipped(NotAService)
//!    │
//!    ├──► Removed ──► delete http, delete tcp ────► Applied
//!    │
//!    └──► Created/Updated ──► inspect ──► gone ───► Skipped(ServiceGone)
//!                                │
//!                                ├──► no ports ───► Skipped(NoEndpoints)
//!                                │
//!                                └──► read base, classify, merge,
//!                                     write http?, write/delete tcp ──► Applied
//! ```
//!
//! A registry failure stops the current event only. The affected records
//! keep their previous state until a later event for the same service.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use swarm_registrator_core::{
    classify, merge, EventKind, HttpPortSetting, LifecycleEvent, ServiceName,
};
use swarm_registrator_docker::{EventStream, Orchestrator, OrchestratorError};
use swarm_registrator_store::{KvStore, RegistryWriter};

use crate::error::{ReconcileError, RegistryOp, RunError};

/// Why an event produced no registry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The event is not a service create, update or remove.
    NotAService,
    /// The service disappeared before it could be inspected.
    ServiceGone,
    /// The service has no endpoint bindings at all.
    NoEndpoints,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Registry records were written or deleted.
    Applied,
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Turns lifecycle events into registry writes.
pub struct Reconciler<S: KvStore, O: Orchestrator> {
    registry: RegistryWriter<S>,
    orchestrator: Arc<O>,
}

impl<S: KvStore, O: Orchestrator> Reconciler<S, O> {
    /// Create a reconciler over a store and an orchestrator.
    #[must_use]
    pub fn new(store: Arc<S>, orchestrator: Arc<O>) -> Self {
        Self {
            registry: RegistryWriter::new(store),
            orchestrator,
        }
    }

    /// Reconcile a single event.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Registry` if a store call fails, or
    /// `ReconcileError::Orchestrator` if inspection fails for a reason other
    /// than the service being gone.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<Outcome, ReconcileError> {
        match event.kind {
            EventKind::Other => Ok(Outcome::Skipped(SkipReason::NotAService)),
            EventKind::ServiceRemoved => {
                self.remove(&event.service_name).await?;
                Ok(Outcome::Applied)
            }
            EventKind::ServiceCreated | EventKind::ServiceUpdated => self.upsert(event).await,
        }
    }

    async fn remove(&self, name: &ServiceName) -> Result<(), ReconcileError> {
        self.registry
            .delete_http(name)
            .await
            .map_err(|e| ReconcileError::registry(name, RegistryOp::DeleteHttp, e))?;
        self.registry
            .delete_tcp(name)
            .await
            .map_err(|e| ReconcileError::registry(name, RegistryOp::DeleteTcp, e))?;

        info!(service = %name, action = "remove", "Removed service registration");
        Ok(())
    }

    async fn upsert(&self, event: &LifecycleEvent) -> Result<Outcome, ReconcileError> {
        let action = event.kind.as_str();

        let service = match self.orchestrator.inspect_service(&event.service_id).await {
            Ok(service) => service,
            Err(OrchestratorError::ServiceNotFound(_)) => {
                info!(
                    service = %event.service_name,
                    service_id = %event.service_id,
                    action,
                    "Service no longer exists, skipping"
                );
                return Ok(Outcome::Skipped(SkipReason::ServiceGone));
            }
            Err(source) => {
                return Err(ReconcileError::Orchestrator {
                    service: event.service_name.clone(),
                    source,
                });
            }
        };

        let name = &service.service_name;

        if service.has_no_endpoints() {
            info!(service = %name, action, "No endpoints found, skipping");
            return Ok(Outcome::Skipped(SkipReason::NoEndpoints));
        }

        let base = self
            .registry
            .read_base_settings(name)
            .await
            .map_err(|e| ReconcileError::registry(name, RegistryOp::ReadBaseSettings, e))?;

        if let HttpPortSetting::Invalid(raw) = base.http_port_setting() {
            warn!(
                service = %name,
                action,
                http_port = %raw,
                "Ignoring unusable http_port, using the first endpoint as HTTP"
            );
        }

        let ports = classify(&service.endpoints, &base);
        if ports.is_ambiguous_fallback(service.endpoints.len()) {
            debug!(
                service = %name,
                endpoints = service.endpoints.len(),
                http_target = ports.http_target.map(|t| t.port()),
                "No http_port configured, using the first endpoint as HTTP"
            );
        }

        match ports.http_port {
            Some(http_port) => {
                let settings = merge(base, Some(http_port));
                self.registry
                    .write_http(name, &settings)
                    .await
                    .map_err(|e| ReconcileError::registry(name, RegistryOp::WriteHttp, e))?;
                info!(service = %name, action, http_port, "Registered HTTP endpoint");
            }
            None => {
                warn!(
                    service = %name,
                    action,
                    "No published HTTP port found, leaving HTTP registration unchanged"
                );
            }
        }

        if ports.tcp_ports.is_empty() {
            self.registry
                .delete_tcp(name)
                .await
                .map_err(|e| ReconcileError::registry(name, RegistryOp::DeleteTcp, e))?;
        } else {
            self.registry
                .write_tcp(name, &ports.tcp_ports)
                .await
                .map_err(|e| ReconcileError::registry(name, RegistryOp::WriteTcp, e))?;
            info!(
                service = %name,
                action,
                tcp_ports = ports.tcp_ports.len(),
                "Registered TCP endpoints"
            );
        }

        Ok(Outcome::Applied)
    }

    /// Process events until shutdown is requested or the feed ends.
    ///
    /// Shutdown is only observed while waiting for the next event; an event
    /// that is already being reconciled is finished first. A dropped
    /// shutdown sender counts as a shutdown request.
    ///
    /// # Errors
    ///
    /// Returns `RunError::StreamEnded` when the feed closes and
    /// `RunError::Stream` when it fails with a transport error. Malformed
    /// events and failed reconciliations are logged and skipped.
    pub async fn run(
        &self,
        mut events: EventStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), RunError> {
        info!("Starting event reconciliation loop");

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, stopping reconciliation loop");
                return Ok(());
            }

            let next = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown signal dropped, stopping reconciliation loop");
                        return Ok(());
                    }
                    continue;
                }
                next = events.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(OrchestratorError::EventDecode(reason))) => {
                    warn!(error = %reason, "Skipping malformed event");
                    continue;
                }
                Some(Err(e)) => {
                    error!(error = %e, "Event stream failed");
                    return Err(RunError::Stream(e));
                }
                None => {
                    warn!("Event stream ended");
                    return Err(RunError::StreamEnded);
                }
            };

            match self.handle(&event).await {
                Ok(Outcome::Applied) => {}
                Ok(Outcome::Skipped(reason)) => {
                    debug!(
                        service = %event.service_name,
                        action = event.kind.as_str(),
                        ?reason,
                        "Event skipped"
                    );
                }
                Err(e) => {
                    error!(
                        service = %e.service(),
                        action = event.kind.as_str(),
                        error = %e,
                        "Failed to reconcile event"
                    );
                }
            }
        }
    }
}
