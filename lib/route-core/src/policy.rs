//! Per-node route advertisement policy

use crate::node::NodeBookkeeper;
use crate::Result;
use route_api::NodeName;
use tracing::debug;

/// Decides whether a node should have a route at all
///
/// Nodes opt out with `node.alpha.kubernetes.io/advertise-route: "false"`.
/// Lookup failures are returned as-is; each caller decides whether they are
/// fatal.
#[derive(Clone)]
pub struct AdvertisePolicy {
    nodes: NodeBookkeeper,
}

impl AdvertisePolicy {
    pub fn new(nodes: NodeBookkeeper) -> Self {
        Self { nodes }
    }

    pub async fn should_advertise(&self, node: &NodeName) -> Result<bool> {
        let annotation = self.nodes.read(node).await?;
        debug!(node = %node, advertise = annotation.advertise_route, "Resolved advertise policy");
        Ok(annotation.advertise_route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::MockNodeMetadataStore;
    use crate::{RouteError, SyncMetrics};
    use route_api::annotation::ANNOTATION_ADVERTISE_ROUTE;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn policy(store: MockNodeMetadataStore) -> AdvertisePolicy {
        AdvertisePolicy::new(NodeBookkeeper::new(
            Arc::new(store),
            SyncMetrics::new().unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_defaults_to_advertise() {
        let mut store = MockNodeMetadataStore::new();
        store
            .expect_get_annotations()
            .returning(|_| Ok(BTreeMap::new()));
        assert!(policy(store)
            .should_advertise(&NodeName::new("10.0.0.5"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_opt_out() {
        let mut store = MockNodeMetadataStore::new();
        store.expect_get_annotations().returning(|_| {
            let mut annotations = BTreeMap::new();
            annotations.insert(ANNOTATION_ADVERTISE_ROUTE.to_string(), "false".to_string());
            Ok(annotations)
        });
        assert!(!policy(store)
            .should_advertise(&NodeName::new("10.0.0.5"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_returned() {
        let mut store = MockNodeMetadataStore::new();
        store
            .expect_get_annotations()
            .returning(|node| Err(RouteError::NodeNotFound(node.clone())));
        let err = policy(store)
            .should_advertise(&NodeName::new("10.0.0.5"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_malformed_annotation_is_an_error() {
        let mut store = MockNodeMetadataStore::new();
        store.expect_get_annotations().returning(|_| {
            let mut annotations = BTreeMap::new();
            annotations.insert(ANNOTATION_ADVERTISE_ROUTE.to_string(), "maybe".to_string());
            Ok(annotations)
        });
        let err = policy(store)
            .should_advertise(&NodeName::new("10.0.0.5"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Annotation(_)));
    }
}
