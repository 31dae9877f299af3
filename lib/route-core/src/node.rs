//! Node metadata bookkeeping
//!
//! Each node that owns a route records which VPC, route table and rule back
//! it. Writes are idempotent: a patch is only issued when a tracked value
//! differs from what is stored.

use crate::{metrics::SyncMetrics, Result, ENGINE_VERSION};
use async_trait::async_trait;
use route_api::{NodeName, NodeRouteAnnotation};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(test)]
use mockall::automock;

/// Reads and patches per-node annotations in the cluster control plane
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeMetadataStore: Send + Sync {
    /// Annotations of the node, empty when it has none.
    ///
    /// Fails with `RouteError::NodeNotFound` when the node does not exist.
    async fn get_annotations(&self, node: &NodeName) -> Result<BTreeMap<String, String>>;

    /// Merge `annotations` into the node's `metadata.annotations`
    async fn patch_annotations(
        &self,
        node: &NodeName,
        annotations: BTreeMap<String, String>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct NodeBookkeeper {
    store: Arc<dyn NodeMetadataStore>,
    metrics: SyncMetrics,
}

impl NodeBookkeeper {
    pub fn new(store: Arc<dyn NodeMetadataStore>, metrics: SyncMetrics) -> Self {
        Self { store, metrics }
    }

    /// Decode the route annotations currently stored on `node`
    pub async fn read(&self, node: &NodeName) -> Result<NodeRouteAnnotation> {
        let annotations = self.store.get_annotations(node).await?;
        Ok(NodeRouteAnnotation::from_annotations(&annotations)?)
    }

    /// Record the route backing `node`. Returns whether a patch was issued.
    pub async fn record_route(
        &self,
        node: &NodeName,
        vpc_id: &str,
        vpc_route_table_id: &str,
        vpc_route_rule_id: &str,
    ) -> Result<bool> {
        let current = self.read(node).await?;
        let changes = current.route_info_changes(
            vpc_id,
            vpc_route_table_id,
            vpc_route_rule_id,
            ENGINE_VERSION,
        );
        if changes.is_empty() {
            debug!(node = %node, "Route annotations up to date");
            return Ok(false);
        }

        info!(
            node = %node,
            vpc_id,
            route_table_id = vpc_route_table_id,
            route_rule_id = vpc_route_rule_id,
            "Updating route annotations"
        );
        self.store.patch_annotations(node, changes).await?;
        self.metrics.route_annotation_patches_total.inc();
        Ok(true)
    }
}
