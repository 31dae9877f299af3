use serde::{Deserialize, Serialize};

/// A compute instance backing a cluster node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub internal_address: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub status: InstanceStatus,
}

impl Instance {
    /// Whether the instance can serve as a route nexthop
    pub fn is_routable(&self) -> bool {
        self.status.is_routable()
    }
}

/// Lifecycle status of a compute instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Running,
    Creating,
    CreateFailed,
    Deleting,
    Deleted,
    Error,
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Instances that failed, are gone, or are going away are never nexthops
    pub fn is_routable(self) -> bool {
        !matches!(
            self,
            InstanceStatus::CreateFailed
                | InstanceStatus::Deleted
                | InstanceStatus::Deleting
                | InstanceStatus::Error
        )
    }
}
