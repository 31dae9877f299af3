//! Event sink publishing Kubernetes Events
//!
//! Publishing is fire-and-forget: failures are logged as warnings and never
//! reach the engine.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use route_core::{EventSink, EventSubject, Severity};
use tracing::warn;

/// Namespace events land in; route engine subjects are cluster-scoped
const EVENT_NAMESPACE: &str = "default";

pub struct KubeEventSink {
    client: Client,
    reporter: Reporter,
}

impl KubeEventSink {
    /// Create a sink reporting as `controller_name`
    pub fn new(client: Client, controller_name: &str) -> Self {
        Self {
            client,
            reporter: Reporter {
                controller: controller_name.to_string(),
                instance: std::env::var("HOSTNAME").ok(),
            },
        }
    }
}

fn object_reference(subject: &EventSubject) -> ObjectReference {
    ObjectReference {
        kind: Some(subject.kind.clone()),
        name: Some(subject.name.clone()),
        namespace: Some(EVENT_NAMESPACE.to_string()),
        ..Default::default()
    }
}

fn event_type(severity: Severity) -> EventType {
    match severity {
        Severity::Normal => EventType::Normal,
        Severity::Warning => EventType::Warning,
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn emit(&self, subject: &EventSubject, severity: Severity, reason: &str, message: String) {
        let recorder = Recorder::new(
            self.client.clone(),
            self.reporter.clone(),
            object_reference(subject),
        );
        let event = Event {
            type_: event_type(severity),
            reason: reason.to_string(),
            note: Some(message),
            action: "Reconcile".to_string(),
            secondary: None,
        };
        if let Err(e) = recorder.publish(event).await {
            warn!(
                reason,
                kind = %subject.kind,
                name = %subject.name,
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}
