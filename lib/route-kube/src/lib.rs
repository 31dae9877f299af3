//! Kubernetes integration for the route engine
pub mod discovery;
pub mod events;
pub mod nodes;

pub use discovery::NodeDiscovery;
pub use events::KubeEventSink;
pub use nodes::KubeNodeStore;
