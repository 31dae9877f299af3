//! Data model for VPC route synchronization
//!
//! This library defines the types shared between the route engine and its
//! cloud/cluster adapters:
//! - RouteRule: an entry in a VPC route table
//! - Route: the cluster-facing view of a pod CIDR route
//! - Instance: a compute instance as reported by the instance directory
//! - NodeRouteAnnotation: per-node route bookkeeping stored as annotations

pub mod annotation;
pub mod instance;
pub mod route;
pub mod rule;

pub use annotation::{AnnotationError, NodeRouteAnnotation};
pub use instance::{Instance, InstanceStatus};
pub use route::{NodeName, Route};
pub use rule::{CreateRouteRuleArgs, NexthopType, RouteRule, ANY_SOURCE_CIDR};
