//! Instance directory API client

use crate::client::ApiClient;
use async_trait::async_trait;
use route_api::Instance;
use route_core::{InstanceDirectory, Result};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListInstancesResponse {
    #[serde(default)]
    instance_list: Vec<Instance>,
}

/// HttpInstanceDirectory lists the compute instances of a cluster
pub struct HttpInstanceDirectory {
    api: ApiClient,
}

impl HttpInstanceDirectory {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl InstanceDirectory for HttpInstanceDirectory {
    async fn list_instances(&self, cluster_id: &str) -> Result<Vec<Instance>> {
        let response: ListInstancesResponse = self
            .api
            .get("/v1/cluster/instances", &[("clusterUuid", cluster_id)])
            .await?;
        debug!(cluster_id, instances = response.instance_list.len(), "Listed cluster instances");
        Ok(response.instance_list)
    }
}
