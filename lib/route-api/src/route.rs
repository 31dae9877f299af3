use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a cluster node
///
/// Nodes are keyed by the internal address of their backing instance, but the
/// key is kept distinct from a raw address so it is only ever compared with
/// other node names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Node name for the instance with the given internal address
    pub fn from_internal_address(address: &str) -> Self {
        Self(address.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A pod CIDR route as seen by the cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Mirrors the id of the underlying route rule
    pub name: String,

    /// Pod CIDR routed to the target node
    pub destination_cidr: String,

    /// Node the traffic is steered to
    pub target_node: NodeName,

    /// Present in the cloud but should be treated as removed
    #[serde(default)]
    pub blackhole: bool,
}

impl Route {
    pub fn new(destination_cidr: impl Into<String>, target_node: NodeName) -> Self {
        Self {
            name: String::new(),
            destination_cidr: destination_cidr.into(),
            target_node,
            blackhole: false,
        }
    }
}
