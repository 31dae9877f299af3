//! Node annotation store backed by the Kubernetes API

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use route_api::NodeName;
use route_core::{NodeMetadataStore, Result, RouteError};
use std::collections::BTreeMap;
use tracing::debug;

/// KubeNodeStore reads and merge-patches node annotations
pub struct KubeNodeStore {
    nodes: Api<Node>,
}

impl KubeNodeStore {
    pub fn new(client: Client) -> Self {
        Self {
            nodes: Api::all(client),
        }
    }
}

/// Merge patch body touching only `metadata.annotations`
fn annotations_patch(annotations: &BTreeMap<String, String>) -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "annotations": annotations,
        }
    })
}

fn transport(e: kube::Error) -> RouteError {
    RouteError::transport(format!("node metadata store: {}", e))
}

#[async_trait]
impl NodeMetadataStore for KubeNodeStore {
    async fn get_annotations(&self, node: &NodeName) -> Result<BTreeMap<String, String>> {
        let found = self.nodes.get_opt(node.as_str()).await.map_err(transport)?;
        match found {
            Some(found) => Ok(found.metadata.annotations.unwrap_or_default()),
            None => Err(RouteError::NodeNotFound(node.clone())),
        }
    }

    async fn patch_annotations(
        &self,
        node: &NodeName,
        annotations: BTreeMap<String, String>,
    ) -> Result<()> {
        let patch = annotations_patch(&annotations);
        debug!(node = %node, patch = %patch, "Patching node annotations");
        self.nodes
            .patch(node.as_str(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(transport)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_are_transport_errors() {
        let err = transport(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "nodes \"10.0.0.5\" is forbidden".to_string(),
            reason: "Forbidden".to_string(),
            code: 403,
        }));
        assert!(matches!(err, RouteError::Transport(ref msg) if msg.contains("forbidden")));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_annotations_patch_shape() {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            "node.alpha.kubernetes.io/vpc-route-rule-id".to_string(),
            "rr-1".to_string(),
        );
        let patch = annotations_patch(&annotations);
        assert_eq!(
            patch,
            serde_json::json!({
                "metadata": {
                    "annotations": {
                        "node.alpha.kubernetes.io/vpc-route-rule-id": "rr-1"
                    }
                }
            })
        );
        assert!(patch.get("spec").is_none());
    }
}
