//! HTTP adapters for the VPC route table and instance directory APIs
pub mod client;
pub mod instances;
pub mod vpc;

pub use client::{ApiClient, ApiClientConfig};
pub use instances::HttpInstanceDirectory;
pub use vpc::HttpRouteTableGateway;
