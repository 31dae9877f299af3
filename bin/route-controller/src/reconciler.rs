//! Periodic reconciliation of node pod CIDRs against the VPC route table

use ipnetwork::IpNetwork;
use route_api::{NodeName, Route};
use route_core::RouteSynchronizer;
use route_kube::NodeDiscovery;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, error, info};

/// Route changes needed to move the VPC towards the desired routes
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoutePlan {
    pub delete: Vec<Route>,
    pub create: Vec<Route>,
}

/// Whether `route` routes part of the cluster's pod address space.
///
/// Routes outside it belong to someone else and are never deleted.
pub fn is_cluster_route(cluster_cidr: &IpNetwork, route: &Route) -> bool {
    match route.destination_cidr.parse::<IpNetwork>() {
        Ok(destination) => {
            cluster_cidr.contains(destination.network()) && destination.prefix() >= cluster_cidr.prefix()
        }
        Err(_) => false,
    }
}

/// Compare desired routes with the routes currently listed.
///
/// Only routes inside `cluster_cidr` are candidates for deletion. Deletions
/// are keyed by destination because a delete clears every rule for that CIDR;
/// a desired route whose CIDR gets cleared is always re-created.
pub fn plan(desired: &[Route], actual: &[Route], cluster_cidr: &IpNetwork) -> RoutePlan {
    let desired_by_cidr: HashMap<&str, &NodeName> = desired
        .iter()
        .map(|route| (route.destination_cidr.as_str(), &route.target_node))
        .collect();

    let mut cleared = BTreeSet::new();
    let mut delete = Vec::new();
    for route in actual.iter().filter(|route| is_cluster_route(cluster_cidr, route)) {
        let wanted = desired_by_cidr.get(route.destination_cidr.as_str()) == Some(&&route.target_node);
        if (route.blackhole || !wanted) && cleared.insert(route.destination_cidr.as_str()) {
            delete.push(route.clone());
        }
    }

    let create = desired
        .iter()
        .filter(|route| {
            cleared.contains(route.destination_cidr.as_str())
                || !actual.iter().any(|existing| {
                    !existing.blackhole
                        && existing.destination_cidr == route.destination_cidr
                        && existing.target_node == route.target_node
                })
        })
        .cloned()
        .collect();

    RoutePlan { delete, create }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub struct RouteReconciler {
    sync: RouteSynchronizer,
    discovery: NodeDiscovery,
    cluster_name: String,
    cluster_cidr: IpNetwork,
}

impl RouteReconciler {
    pub fn new(
        sync: RouteSynchronizer,
        discovery: NodeDiscovery,
        cluster_name: String,
        cluster_cidr: IpNetwork,
    ) -> Self {
        Self {
            sync,
            discovery,
            cluster_name,
            cluster_cidr,
        }
    }

    /// Run one pass. Individual create/delete failures are logged and left
    /// for the next pass.
    pub async fn reconcile(&self) -> anyhow::Result<ReconcileStats> {
        let desired = self.discovery.desired_routes().await?;
        let actual = self.sync.list_routes(&self.cluster_name).await?;
        let plan = plan(&desired, &actual, &self.cluster_cidr);
        debug!(
            desired = desired.len(),
            actual = actual.len(),
            delete = plan.delete.len(),
            create = plan.create.len(),
            "Planned route changes"
        );

        let mut stats = ReconcileStats::default();
        for route in &plan.delete {
            match self.sync.delete_route(&self.cluster_name, route).await {
                Ok(()) => stats.deleted += 1,
                Err(e) => {
                    error!(cidr = %route.destination_cidr, node = %route.target_node, "Error deleting route: {}", e);
                    stats.failed += 1;
                }
            }
        }
        for route in &plan.create {
            let name_hint = route.target_node.to_string();
            match self.sync.create_route(&self.cluster_name, &name_hint, route).await {
                Ok(()) => stats.created += 1,
                Err(e) => {
                    error!(cidr = %route.destination_cidr, node = %route.target_node, "Error creating route: {}", e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            created = stats.created,
            deleted = stats.deleted,
            failed = stats.failed,
            "Route reconciliation pass complete"
        );
        Ok(stats)
    }
}
