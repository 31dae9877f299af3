//! Desired routes discovered from cluster nodes

use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::Client;
use route_api::{NodeName, Route};
use tracing::debug;

/// NodeDiscovery derives the routes the cluster wants from node pod CIDRs
pub struct NodeDiscovery {
    nodes: Api<Node>,
}

impl NodeDiscovery {
    pub fn new(client: Client) -> Self {
        Self {
            nodes: Api::all(client),
        }
    }

    /// One route per node with an allocated pod CIDR
    pub async fn desired_routes(&self) -> anyhow::Result<Vec<Route>> {
        let list = self.nodes.list(&ListParams::default()).await?;
        let routes: Vec<Route> = list.items.iter().filter_map(desired_route).collect();

        debug!("Discovered {} nodes, {} with pod CIDRs", list.items.len(), routes.len());
        Ok(routes)
    }
}

/// The route a node needs, if it has a name and a pod CIDR
pub fn desired_route(node: &Node) -> Option<Route> {
    let name = node.metadata.name.as_ref()?;
    let pod_cidr = node.spec.as_ref()?.pod_cidr.as_ref()?;
    if pod_cidr.is_empty() {
        return None;
    }
    Some(Route::new(pod_cidr.clone(), NodeName::new(name.clone())))
}
