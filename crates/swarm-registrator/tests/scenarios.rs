//! End-to-end reconciliation scenarios against in-memory collaborators.

use std::sync::Arc;

use futures::stream;
use tokio::sync::watch;

use swarm_registrator::{Outcome, Reconciler, RunError, SkipReason};
use swarm_registrator_core::{EndpointBinding, LifecycleEvent, Protocol, ServiceDescriptor};
use swarm_registrator_docker::{decode_lines, EventStream, MockOrchestrator, Orchestrator};
use swarm_registrator_store::{KvCall, MemoryStore};

type TestReconciler = Reconciler<MemoryStore, MockOrchestrator>;

struct Harness {
    store: Arc<MemoryStore>,
    orchestrator: Arc<MockOrchestrator>,
    reconciler: TestReconciler,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(MockOrchestrator::new());
        let reconciler = Reconciler::new(Arc::clone(&store), Arc::clone(&orchestrator));
        Self {
            store,
            orchestrator,
            reconciler,
        }
    }

    /// Run the loop over everything queued on the mock until the feed ends.
    async fn drain(&self) {
        let events = self.orchestrator.events().await.unwrap();
        self.run(events).await;
    }

    async fn run(&self, events: EventStream) {
        let (_tx, rx) = watch::channel(false);
        let result = self.reconciler.run(events, rx).await;
        assert!(matches!(result, Err(RunError::StreamEnded)));
    }

    fn http(&self, name: &str) -> Option<String> {
        self.store
            .value_str(&format!("swarm-registrator/v1/http/{name}"))
    }

    fn tcp(&self, name: &str) -> Option<String> {
        self.store.value_str(&format!("swarm-registrator/v1/tcp/{name}"))
    }
}

fn raw_event(kind: &str, action: &str, id: &str, name: &str) -> String {
    format!(
        r#"{{"Type":"{kind}","Action":"{action}","Actor":{{"ID":"{id}","Attributes":{{"name":"{name}"}}}},"time":1700000000}}"#
    )
}

fn feed(lines: &[String]) -> EventStream {
    let body = lines.iter().map(|line| format!("{line}\n")).collect::<String>();
    let chunks: Vec<swarm_registrator_docker::Result<Vec<u8>>> = vec![Ok(body.into_bytes())];
    decode_lines(stream::iter(chunks))
}

#[tokio::test]
async fn created_service_with_one_port_registers_http_only() {
    let h = Harness::new();
    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new("web", vec![EndpointBinding::published(80, 8080)]),
    );
    h.orchestrator
        .push_event(LifecycleEvent::created("s-web", "web"));

    h.drain().await;

    assert_eq!(h.http("web").as_deref(), Some(r#"{"swarm_port":"8080"}"#));
    assert_eq!(h.tcp("web"), None);
}

#[tokio::test]
async fn configured_http_port_splits_http_and_tcp() {
    let h = Harness::new();
    h.store.insert("appsettings/v1/api", r#"{"http_port": 9000}"#);
    h.orchestrator.set_service(
        "s-api",
        ServiceDescriptor::new(
            "api",
            vec![
                EndpointBinding::published(9000, 31000),
                EndpointBinding::published(22, 31022),
            ],
        ),
    );
    h.orchestrator
        .push_event(LifecycleEvent::updated("s-api", "api"));

    h.drain().await;

    assert_eq!(
        h.http("api").as_deref(),
        Some(r#"{"http_port":9000,"swarm_port":"31000"}"#)
    );
    assert_eq!(h.tcp("api").as_deref(), Some(r#"[{"31022":22}]"#));
}

#[tokio::test]
async fn unpublished_ports_leave_http_and_clear_tcp() {
    let h = Harness::new();
    h.store
        .insert("swarm-registrator/v1/http/worker", r#"{"swarm_port":"30000"}"#);
    h.store
        .insert("swarm-registrator/v1/tcp/worker", r#"[{"31022":22}]"#);
    h.orchestrator.set_service(
        "s-worker",
        ServiceDescriptor::new("worker", vec![EndpointBinding::unpublished(7000)]),
    );
    h.orchestrator
        .push_event(LifecycleEvent::updated("s-worker", "worker"));

    h.drain().await;

    assert_eq!(
        h.http("worker").as_deref(),
        Some(r#"{"swarm_port":"30000"}"#)
    );
    assert_eq!(h.tcp("worker"), None);

    let writes: Vec<KvCall> = h.store.calls().into_iter().filter(KvCall::is_write).collect();
    assert_eq!(
        writes,
        vec![KvCall::Delete {
            key: "swarm-registrator/v1/tcp/worker".to_string(),
            recursive: false,
        }]
    );
}

#[tokio::test]
async fn non_service_events_touch_nothing() {
    let h = Harness::new();

    h.run(feed(&[raw_event("container", "start", "c1", "/nginx")]))
        .await;

    assert!(h.orchestrator.inspections().is_empty());
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn applying_the_same_event_twice_is_idempotent() {
    let h = Harness::new();
    h.store.insert("appsettings/v1/api", r#"{"http_port":9000,"replicas":2}"#);
    h.orchestrator.set_service(
        "s-api",
        ServiceDescriptor::new(
            "api",
            vec![
                EndpointBinding::published(9000, 31000),
                EndpointBinding::published(5353, 31053).with_protocol(Protocol::Udp),
            ],
        ),
    );

    let event = LifecycleEvent::created("s-api", "api");
    assert_eq!(h.reconciler.handle(&event).await.unwrap(), Outcome::Applied);
    let once = h.store.snapshot();

    assert_eq!(h.reconciler.handle(&event).await.unwrap(), Outcome::Applied);
    assert_eq!(h.store.snapshot(), once);
}

#[tokio::test]
async fn removal_deletes_both_records_even_if_absent() {
    let h = Harness::new();
    h.store.insert("swarm-registrator/v1/http/web", r#"{"swarm_port":"8080"}"#);
    h.store.insert("swarm-registrator/v1/tcp/web", r#"[{"31022":22}]"#);
    h.store
        .insert("swarm-registrator/v1/http/web-admin", r#"{"swarm_port":"8081"}"#);

    let removed = LifecycleEvent::removed("s-web", "web");
    assert_eq!(h.reconciler.handle(&removed).await.unwrap(), Outcome::Applied);
    assert_eq!(h.http("web"), None);
    assert_eq!(h.tcp("web"), None);
    assert!(h.http("web-admin").is_some());

    let never_existed = LifecycleEvent::removed("s-ghost", "ghost");
    assert_eq!(
        h.reconciler.handle(&never_existed).await.unwrap(),
        Outcome::Applied
    );
    assert!(h.orchestrator.inspections().is_empty());
}

#[tokio::test]
async fn create_then_remove_race_is_skipped() {
    let h = Harness::new();
    h.orchestrator
        .push_event(LifecycleEvent::created("s-web", "web"));
    h.orchestrator
        .push_event(LifecycleEvent::removed("s-web", "web"));

    h.drain().await;

    assert_eq!(h.orchestrator.inspections().len(), 1);
    assert_eq!(h.http("web"), None);
    assert_eq!(h.tcp("web"), None);
}

#[tokio::test]
async fn service_without_endpoints_is_skipped() {
    let h = Harness::new();
    h.orchestrator
        .set_service("s-batch", ServiceDescriptor::new("batch", vec![]));

    let outcome = h
        .reconciler
        .handle(&LifecycleEvent::created("s-batch", "batch"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoEndpoints));
    assert!(h.store.calls().is_empty());
}

#[tokio::test]
async fn failure_for_one_service_does_not_block_others() {
    let h = Harness::new();
    h.store.fail_key("swarm-registrator/v1/http/web");
    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new("web", vec![EndpointBinding::published(80, 8080)]),
    );
    h.orchestrator.set_service(
        "s-api",
        ServiceDescriptor::new("api", vec![EndpointBinding::published(80, 8081)]),
    );
    h.orchestrator
        .push_event(LifecycleEvent::created("s-web", "web"));
    h.orchestrator
        .push_event(LifecycleEvent::created("s-api", "api"));

    h.drain().await;

    assert_eq!(h.http("web"), None);
    assert_eq!(h.http("api").as_deref(), Some(r#"{"swarm_port":"8081"}"#));
}

#[tokio::test]
async fn malformed_events_are_skipped() {
    let h = Harness::new();
    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new("web", vec![EndpointBinding::published(80, 8080)]),
    );

    h.run(feed(&[
        "{not json".to_string(),
        r#"{"Type":"service","Action":"create","Actor":{"ID":"s-web"}}"#.to_string(),
        raw_event("service", "create", "s-web", "web"),
    ]))
    .await;

    assert_eq!(h.orchestrator.inspections().len(), 1);
    assert_eq!(h.http("web").as_deref(), Some(r#"{"swarm_port":"8080"}"#));
}

#[tokio::test]
async fn later_update_replaces_earlier_registration() {
    let h = Harness::new();
    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new(
            "web",
            vec![
                EndpointBinding::published(80, 8080),
                EndpointBinding::published(22, 31022),
            ],
        ),
    );
    let event = LifecycleEvent::created("s-web", "web");
    h.reconciler.handle(&event).await.unwrap();
    assert_eq!(h.tcp("web").as_deref(), Some(r#"[{"31022":22}]"#));

    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new("web", vec![EndpointBinding::published(80, 8090)]),
    );
    h.reconciler
        .handle(&LifecycleEvent::updated("s-web", "web"))
        .await
        .unwrap();

    assert_eq!(h.http("web").as_deref(), Some(r#"{"swarm_port":"8090"}"#));
    assert_eq!(h.tcp("web"), None);
}

#[tokio::test]
async fn stale_swarm_port_of_any_shape_is_replaced() {
    let h = Harness::new();
    h.store
        .insert("appsettings/v1/web", r#"{"swarm_port": 99999, "url": "x"}"#);
    h.orchestrator.set_service(
        "s-web",
        ServiceDescriptor::new(
            "web",
            vec![
                EndpointBinding::published(80, 8080),
                EndpointBinding::published(22, 31022),
            ],
        ),
    );

    let outcome = h
        .reconciler
        .handle(&LifecycleEvent::created("s-web", "web"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Applied);
    assert_eq!(
        h.http("web").as_deref(),
        Some(r#"{"swarm_port":"8080","url":"x"}"#)
    );
    assert_eq!(h.tcp("web").as_deref(), Some(r#"[{"31022":22}]"#));
}

#[tokio::test]
async fn unusable_http_port_falls_back_to_first_endpoint() {
    let h = Harness::new();
    h.store.insert("appsettings/v1/api", r#"{"http_port": 9000.0}"#);
    h.orchestrator.set_service(
        "s-api",
        ServiceDescriptor::new(
            "api",
            vec![
                EndpointBinding::published(80, 30080),
                EndpointBinding::published(9000, 31000),
            ],
        ),
    );

    h.reconciler
        .handle(&LifecycleEvent::updated("s-api", "api"))
        .await
        .unwrap();

    assert_eq!(
        h.http("api").as_deref(),
        Some(r#"{"http_port":9000.0,"swarm_port":"30080"}"#)
    );
    assert_eq!(h.tcp("api").as_deref(), Some(r#"[{"31000":9000}]"#));
}

#[tokio::test]
async fn base_settings_are_written_back_as_stored() {
    let h = Harness::new();
    h.store.insert(
        "appsettings/v1/api",
        r#"{"http_port":"9000","limits":{"cpu":0.5},"tags":["a","b"]}"#,
    );
    h.orchestrator.set_service(
        "s-api",
        ServiceDescriptor::new(
            "api",
            vec![
                EndpointBinding::published(22, 31022),
                EndpointBinding::published(9000, 31000),
            ],
        ),
    );

    h.reconciler
        .handle(&LifecycleEvent::created("s-api", "api"))
        .await
        .unwrap();

    assert_eq!(
        h.http("api").as_deref(),
        Some(r#"{"http_port":"9000","limits":{"cpu":0.5},"swarm_port":"31000","tags":["a","b"]}"#)
    );
    assert_eq!(h.tcp("api").as_deref(), Some(r#"[{"31022":22}]"#));
}
