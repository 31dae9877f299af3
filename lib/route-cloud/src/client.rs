//! Shared JSON client for the cloud APIs

use reqwest::{Client, RequestBuilder, Response};
use route_core::{Result, RouteError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct ApiClientConfig {
    /// Base URL, e.g. `https://vpc.example.com`
    pub endpoint: String,
    /// Optional bearer token
    pub token: Option<String>,
    /// Timeout for a single request
    pub timeout: Duration,
}

impl ApiClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// ApiClient sends JSON requests and maps every failure to a transport error
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.client.get(self.url(path)).query(query);
        let response = self.send(request).await?;
        response.json().await.map_err(transport)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.send(request).await?;
        response.json().await.map_err(transport)
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.client.delete(self.url(path));
        self.send(request).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!(url = %response.url(), status = %status, "Cloud API response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::transport(format!(
                "cloud API returned {}: {}",
                status,
                body.trim()
            )));
        }
        Ok(response)
    }
}

fn transport(e: reqwest::Error) -> RouteError {
    RouteError::transport(e.to_string())
}
