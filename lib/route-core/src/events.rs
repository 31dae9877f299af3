//! Event emission for route engine findings
//!
//! Events are fire-and-forget: sinks log their own failures and never return
//! an error to the engine.

use async_trait::async_trait;

/// Object an event is about
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSubject {
    pub kind: String,
    pub name: String,
}

impl EventSubject {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

/// Destination for engine events
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, subject: &EventSubject, severity: Severity, reason: &str, message: String);
}

/// Sink that drops every event
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _subject: &EventSubject, _severity: Severity, _reason: &str, _message: String) {}
}

/// Well-known event reasons
pub mod reasons {
    /// A generated route rule overlaps an operator-created one
    pub const ROUTE_TABLE_CONFLICT_DETECTION: &str = "RouteTableConflictDetection";
}
