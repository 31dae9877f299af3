//! Route bookkeeping persisted as node annotations
//!
//! ```text
//! node.alpha.kubernetes.io/vpc-id: "vpc-xxx"
//! node.alpha.kubernetes.io/vpc-route-table-id: "rt-xxx"
//! node.alpha.kubernetes.io/vpc-route-rule-id: "rr-xxx"
//! node.alpha.kubernetes.io/engine-version: "0.1.0"
//! node.alpha.kubernetes.io/advertise-route: "true"
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

pub const ANNOTATION_VPC_ID: &str = "node.alpha.kubernetes.io/vpc-id";
pub const ANNOTATION_VPC_ROUTE_TABLE_ID: &str = "node.alpha.kubernetes.io/vpc-route-table-id";
pub const ANNOTATION_VPC_ROUTE_RULE_ID: &str = "node.alpha.kubernetes.io/vpc-route-rule-id";
pub const ANNOTATION_ENGINE_VERSION: &str = "node.alpha.kubernetes.io/engine-version";
pub const ANNOTATION_ADVERTISE_ROUTE: &str = "node.alpha.kubernetes.io/advertise-route";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation {key} has invalid boolean value {value:?}")]
    InvalidBool { key: String, value: String },
}

/// Decoded route annotations of a single node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRouteAnnotation {
    pub vpc_id: String,
    pub vpc_route_table_id: String,
    pub vpc_route_rule_id: String,
    pub engine_version: String,
    /// Whether a route should be established for this node at all
    pub advertise_route: bool,
}

impl Default for NodeRouteAnnotation {
    fn default() -> Self {
        Self {
            vpc_id: String::new(),
            vpc_route_table_id: String::new(),
            vpc_route_rule_id: String::new(),
            engine_version: String::new(),
            advertise_route: true,
        }
    }
}

impl NodeRouteAnnotation {
    /// Decode the recognized keys from a node's annotation map
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Self, AnnotationError> {
        let get = |key: &str| annotations.get(key).cloned().unwrap_or_default();

        let advertise_route = match annotations.get(ANNOTATION_ADVERTISE_ROUTE) {
            Some(value) => parse_bool(value).ok_or_else(|| AnnotationError::InvalidBool {
                key: ANNOTATION_ADVERTISE_ROUTE.to_string(),
                value: value.clone(),
            })?,
            None => true,
        };

        Ok(Self {
            vpc_id: get(ANNOTATION_VPC_ID),
            vpc_route_table_id: get(ANNOTATION_VPC_ROUTE_TABLE_ID),
            vpc_route_rule_id: get(ANNOTATION_VPC_ROUTE_RULE_ID),
            engine_version: get(ANNOTATION_ENGINE_VERSION),
            advertise_route,
        })
    }

    /// Annotations that must be written for the node to record the given
    /// route. Empty when the stored values already match.
    pub fn route_info_changes(
        &self,
        vpc_id: &str,
        vpc_route_table_id: &str,
        vpc_route_rule_id: &str,
        engine_version: &str,
    ) -> BTreeMap<String, String> {
        let mut changes = BTreeMap::new();
        let tracked = [
            (ANNOTATION_VPC_ID, &self.vpc_id, vpc_id),
            (ANNOTATION_VPC_ROUTE_TABLE_ID, &self.vpc_route_table_id, vpc_route_table_id),
            (ANNOTATION_VPC_ROUTE_RULE_ID, &self.vpc_route_rule_id, vpc_route_rule_id),
            (ANNOTATION_ENGINE_VERSION, &self.engine_version, engine_version),
        ];
        for (key, current, desired) in tracked {
            if current != desired {
                changes.insert(key.to_string(), desired.to_string());
            }
        }
        changes
    }
}

/// Accepts the boolean spellings Kubernetes tooling commonly writes
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
