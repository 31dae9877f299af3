//! VPC route table API client

use crate::client::ApiClient;
use async_trait::async_trait;
use route_api::{CreateRouteRuleArgs, RouteRule};
use route_core::{Result, RouteTableGateway};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRouteTableResponse {
    #[serde(default)]
    route_table_id: String,
    #[serde(default)]
    route_rules: Vec<RouteRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRouteRuleResponse {
    route_rule_id: String,
}

/// HttpRouteTableGateway talks to the VPC route table API
pub struct HttpRouteTableGateway {
    api: ApiClient,
}

impl HttpRouteTableGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl RouteTableGateway for HttpRouteTableGateway {
    async fn list_route_table(&self, vpc_id: &str) -> Result<Vec<RouteRule>> {
        let response: ListRouteTableResponse =
            self.api.get("/v1/route", &[("vpcId", vpc_id)]).await?;
        debug!(
            vpc_id,
            route_table_id = %response.route_table_id,
            rules = response.route_rules.len(),
            "Listed VPC route table"
        );
        Ok(response.route_rules)
    }

    async fn create_route_rule(&self, args: &CreateRouteRuleArgs) -> Result<String> {
        let response: CreateRouteRuleResponse = self.api.post("/v1/route/rule", args).await?;
        Ok(response.route_rule_id)
    }

    async fn delete_route_rule(&self, route_rule_id: &str) -> Result<()> {
        self.api
            .delete(&format!("/v1/route/rule/{}", route_rule_id))
            .await
    }
}
