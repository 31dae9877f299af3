use serde::{Deserialize, Serialize};

/// Source CIDR used by every route rule the engine manages
pub const ANY_SOURCE_CIDR: &str = "0.0.0.0/0";

/// A single entry in a VPC route table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    pub route_rule_id: String,
    pub route_table_id: String,

    /// Destination CIDR of the rule
    #[serde(rename = "destinationAddress")]
    pub destination_cidr: String,

    /// Source CIDR of the rule
    #[serde(rename = "sourceAddress")]
    pub source_cidr: String,

    pub nexthop_type: NexthopType,

    /// Instance id for `custom` nexthops
    #[serde(default)]
    pub nexthop_id: String,

    /// Free text, used to tag machine-generated entries
    #[serde(default)]
    pub description: String,
}

impl RouteRule {
    /// Whether this rule routes `destination_cidr` from any source
    pub fn matches_destination(&self, destination_cidr: &str) -> bool {
        self.destination_cidr == destination_cidr && self.source_cidr == ANY_SOURCE_CIDR
    }

    /// Whether the nexthop of this rule is a compute instance
    pub fn is_instance_route(&self) -> bool {
        self.nexthop_type == NexthopType::Custom
    }
}

/// Kind of nexthop a route rule points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NexthopType {
    /// A compute instance
    Custom,
    /// A VPN gateway
    Vpn,
    /// A NAT gateway
    Nat,
    /// A dedicated-line gateway
    DcGateway,
    /// A VPC peering connection
    PeerConn,
    /// Anything this engine does not know about
    #[serde(other)]
    Other,
}

/// Arguments for creating a route rule through the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRouteRuleArgs {
    pub route_table_id: String,
    pub description: String,
    #[serde(rename = "destinationAddress")]
    pub destination_cidr: String,
    #[serde(rename = "sourceAddress")]
    pub source_cidr: String,
    pub nexthop_type: NexthopType,
    pub nexthop_id: String,
}
