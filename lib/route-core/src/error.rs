use route_api::{AnnotationError, NodeName};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouteError>;

#[derive(Error, Debug)]
pub enum RouteError {
    /// The VPC cannot be resolved, e.g. no instances exist yet
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeName),

    /// A gateway, directory or metadata store call failed
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No live instance found for node {0}")]
    NexthopUnresolved(NodeName),

    #[error("Invalid route table: {0}")]
    InvalidRouteTable(String),

    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),
}

impl RouteError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteError::NodeNotFound(_))
    }
}
