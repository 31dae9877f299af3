//! VPC route synchronization engine
//!
//! This library provides:
//! - Route synchronizer: list/create/delete pod CIDR routes in a VPC route table
//! - Conflict detection between generated and operator-created route rules
//! - Per-node advertise policy and idempotent node annotation bookkeeping
//! - Collaborator traits for the route table, instance directory, node store and event sink

pub mod cloud;
pub mod conflict;
pub mod error;
pub mod events;
pub mod metrics;
pub mod node;
pub mod policy;
pub mod routes;

#[cfg(test)]
mod testing;

pub use cloud::{InstanceDirectory, RouteTableGateway};
pub use conflict::ConflictDetector;
pub use error::{Result, RouteError};
pub use events::{EventSink, EventSubject, NoopEventSink, Severity};
pub use metrics::SyncMetrics;
pub use node::{NodeBookkeeper, NodeMetadataStore};
pub use policy::AdvertisePolicy;
pub use routes::{RouteSynchronizer, SyncBackends, VpcNetwork};

/// Version recorded on every node this engine manages
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
