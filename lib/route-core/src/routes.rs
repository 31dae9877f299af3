//! Route synchronization between a cluster and its VPC route table
//!
//! The synchronizer answers three calls from an outer reconciliation loop:
//! list the routes currently steering pod CIDRs to nodes, create a route for a
//! node, and delete the routes for a destination. Every call is independent
//! and safe to repeat; nothing is retried here.

use crate::cloud::{InstanceDirectory, RouteTableGateway};
use crate::conflict::{generated_description, ConflictDetector};
use crate::events::EventSink;
use crate::metrics::SyncMetrics;
use crate::node::{NodeBookkeeper, NodeMetadataStore};
use crate::policy::AdvertisePolicy;
use crate::{Result, RouteError};
use route_api::{
    CreateRouteRuleArgs, NexthopType, NodeName, Route, RouteRule, ANY_SOURCE_CIDR,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// External systems the synchronizer talks to
#[derive(Clone)]
pub struct SyncBackends {
    pub gateway: Arc<dyn RouteTableGateway>,
    pub directory: Arc<dyn InstanceDirectory>,
    pub nodes: Arc<dyn NodeMetadataStore>,
    pub events: Arc<dyn EventSink>,
}

/// VPC membership of the cluster, resolved from any of its instances
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VpcNetwork {
    pub vpc_id: String,
    pub subnet_id: String,
}

pub struct RouteSynchronizer {
    cluster_id: String,
    gateway: Arc<dyn RouteTableGateway>,
    directory: Arc<dyn InstanceDirectory>,
    nodes: NodeBookkeeper,
    policy: AdvertisePolicy,
    detector: ConflictDetector,
    metrics: SyncMetrics,
    network: OnceCell<VpcNetwork>,
}

impl RouteSynchronizer {
    pub fn new(cluster_id: impl Into<String>, backends: SyncBackends, metrics: SyncMetrics) -> Self {
        let nodes = NodeBookkeeper::new(backends.nodes, metrics.clone());
        Self {
            cluster_id: cluster_id.into(),
            gateway: backends.gateway,
            directory: backends.directory,
            policy: AdvertisePolicy::new(nodes.clone()),
            nodes,
            detector: ConflictDetector::new(backends.events, metrics.clone()),
            metrics,
            network: OnceCell::new(),
        }
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    /// The cached VPC membership, if it has been resolved
    pub fn cached_network(&self) -> Option<&VpcNetwork> {
        self.network.get()
    }

    /// Resolve the cluster's VPC once per synchronizer.
    ///
    /// Concurrent first callers wait on the same resolution. A failed
    /// resolution is not cached, so an empty directory is retried on the next
    /// call.
    pub async fn network(&self) -> Result<&VpcNetwork> {
        self.network
            .get_or_try_init(|| async {
                let instances = self.directory.list_instances(&self.cluster_id).await?;
                let instance = instances.first().ok_or_else(|| {
                    RouteError::Configuration(format!(
                        "no instances found for cluster {}, cannot resolve VPC",
                        self.cluster_id
                    ))
                })?;
                info!(
                    cluster = %self.cluster_id,
                    vpc_id = %instance.vpc_id,
                    subnet_id = %instance.subnet_id,
                    "Resolved cluster VPC"
                );
                Ok(VpcNetwork {
                    vpc_id: instance.vpc_id.clone(),
                    subnet_id: instance.subnet_id.clone(),
                })
            })
            .await
    }

    /// List the managed routes of the cluster.
    ///
    /// Also dispatches a conflict scan of the fetched route table on the
    /// current tokio runtime. The scan is diagnostics only: it is never
    /// awaited and may be dropped on shutdown.
    pub async fn list_routes(&self, cluster_name: &str) -> Result<Vec<Route>> {
        let result = self.list_routes_inner(cluster_name).await;
        self.observe("list_routes", result)
    }

    /// Create a route steering `route.destination_cidr` to `route.target_node`.
    ///
    /// `route.name` is ignored. Nodes that opted out of route advertisement
    /// and instances that are going away are skipped without error.
    pub async fn create_route(&self, cluster_name: &str, name_hint: &str, route: &Route) -> Result<()> {
        let result = self.create_route_inner(cluster_name, name_hint, route).await;
        self.observe("create_route", result)
    }

    /// Delete every rule routing `route.destination_cidr` from any source,
    /// whichever node it points at.
    pub async fn delete_route(&self, cluster_name: &str, route: &Route) -> Result<()> {
        let result = self.delete_route_inner(cluster_name, route).await;
        self.observe("delete_route", result)
    }

    async fn list_routes_inner(&self, cluster_name: &str) -> Result<Vec<Route>> {
        let vpc_id = self.network().await?.vpc_id.clone();
        let rules = self.gateway.list_route_table(&vpc_id).await?;

        let detector = self.detector.clone();
        let snapshot = rules.clone();
        tokio::spawn(async move {
            detector.run(snapshot).await;
        });

        let instances = self.directory.list_instances(&self.cluster_id).await?;
        let addresses: HashMap<&str, &str> = instances
            .iter()
            .map(|instance| (instance.instance_id.as_str(), instance.internal_address.as_str()))
            .collect();

        let mut routes = Vec::new();
        for rule in rules.iter().filter(|rule| rule.is_instance_route()) {
            let Some(address) = addresses.get(rule.nexthop_id.as_str()) else {
                debug!(rule = %rule.route_rule_id, nexthop = %rule.nexthop_id, "Skipping rule with unknown nexthop");
                continue;
            };
            let node = NodeName::from_internal_address(address);

            let advertise = match self.policy.should_advertise(&node).await {
                Ok(advertise) => advertise,
                Err(e) => {
                    warn!(rule = %rule.route_rule_id, node = %node, error = %e, "Skipping rule, advertise policy lookup failed");
                    continue;
                }
            };

            self.nodes
                .record_route(&node, &vpc_id, &rule.route_table_id, &rule.route_rule_id)
                .await?;

            routes.push(Route {
                name: rule.route_rule_id.clone(),
                destination_cidr: rule.destination_cidr.clone(),
                target_node: node,
                blackhole: !advertise,
            });
        }

        debug!(cluster = %cluster_name, routes = routes.len(), "Listed routes");
        self.metrics.routes_listed.set(routes.len() as i64);
        Ok(routes)
    }

    async fn create_route_inner(&self, cluster_name: &str, name_hint: &str, route: &Route) -> Result<()> {
        debug!(
            cluster = %cluster_name,
            name_hint,
            node = %route.target_node,
            cidr = %route.destination_cidr,
            "Creating route"
        );
        let (vpc_id, rules) = self.route_table().await?;
        let route_table_id = match rules.first() {
            Some(rule) => rule.route_table_id.clone(),
            None => {
                return Err(RouteError::InvalidRouteTable(format!(
                    "VPC {} has no route rules",
                    vpc_id
                )))
            }
        };

        if !self.policy.should_advertise(&route.target_node).await? {
            info!(node = %route.target_node, "Node opted out of route advertisement, not creating route");
            return Ok(());
        }

        let instances = self.directory.list_instances(&self.cluster_id).await?;
        let mut instance_id = None;
        if let Some(instance) = instances
            .iter()
            .find(|instance| NodeName::from_internal_address(&instance.internal_address) == route.target_node)
        {
            if !instance.is_routable() {
                info!(
                    node = %route.target_node,
                    instance = %instance.instance_id,
                    status = ?instance.status,
                    "Instance is not routable, not creating route"
                );
                return Ok(());
            }
            instance_id = Some(instance.instance_id.clone());
        }

        let mut stale: Vec<&RouteRule> = Vec::new();
        for rule in rules
            .iter()
            .filter(|rule| rule.matches_destination(&route.destination_cidr))
        {
            if instance_id.as_deref() == Some(rule.nexthop_id.as_str()) {
                debug!(rule = %rule.route_rule_id, "Route rule already exists");
                return Ok(());
            }
            stale.push(rule);
        }

        for rule in stale {
            info!(
                rule = %rule.route_rule_id,
                cidr = %rule.destination_cidr,
                nexthop = %rule.nexthop_id,
                "Deleting stale route rule"
            );
            self.gateway.delete_route_rule(&rule.route_rule_id).await?;
            self.metrics.route_rules_deleted_total.inc();
        }

        let instance_id =
            instance_id.ok_or_else(|| RouteError::NexthopUnresolved(route.target_node.clone()))?;

        let args = CreateRouteRuleArgs {
            route_table_id: route_table_id.clone(),
            description: generated_description(&self.cluster_id),
            destination_cidr: route.destination_cidr.clone(),
            source_cidr: ANY_SOURCE_CIDR.to_string(),
            nexthop_type: NexthopType::Custom,
            nexthop_id: instance_id,
        };
        debug!(?args, "Creating route rule");
        let route_rule_id = self.gateway.create_route_rule(&args).await?;
        self.metrics.route_rules_created_total.inc();

        self.nodes
            .record_route(&route.target_node, &vpc_id, &route_table_id, &route_rule_id)
            .await?;

        info!(
            cluster = %cluster_name,
            node = %route.target_node,
            cidr = %route.destination_cidr,
            rule = %route_rule_id,
            "Created route"
        );
        Ok(())
    }

    async fn delete_route_inner(&self, cluster_name: &str, route: &Route) -> Result<()> {
        debug!(
            cluster = %cluster_name,
            node = %route.target_node,
            cidr = %route.destination_cidr,
            "Deleting route"
        );
        let (_, rules) = self.route_table().await?;
        for rule in rules
            .iter()
            .filter(|rule| rule.matches_destination(&route.destination_cidr))
        {
            info!(rule = %rule.route_rule_id, cidr = %rule.destination_cidr, "Deleting route rule");
            self.gateway.delete_route_rule(&rule.route_rule_id).await?;
            self.metrics.route_rules_deleted_total.inc();
        }

        info!(cluster = %cluster_name, cidr = %route.destination_cidr, "Deleted route");
        Ok(())
    }

    async fn route_table(&self) -> Result<(String, Vec<RouteRule>)> {
        let vpc_id = self.network().await?.vpc_id.clone();
        let rules = self.gateway.list_route_table(&vpc_id).await?;
        Ok((vpc_id, rules))
    }

    fn observe<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(operation, error = %e, "Route operation failed");
            self.metrics.record_error(operation);
        }
        result
    }
}
