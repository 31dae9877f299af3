//! Cloud-side collaborators: the VPC route table and the instance directory

use crate::Result;
use async_trait::async_trait;
use route_api::{CreateRouteRuleArgs, Instance, RouteRule};

#[cfg(test)]
use mockall::automock;

/// Lists, creates and deletes VPC route table entries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteTableGateway: Send + Sync {
    /// All route rules of the given VPC, in gateway order
    async fn list_route_table(&self, vpc_id: &str) -> Result<Vec<RouteRule>>;

    /// Create a rule and return its id
    async fn create_route_rule(&self, args: &CreateRouteRuleArgs) -> Result<String>;

    async fn delete_route_rule(&self, route_rule_id: &str) -> Result<()>;
}

/// Resolves the compute instances of a cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    async fn list_instances(&self, cluster_id: &str) -> Result<Vec<Instance>>;
}
