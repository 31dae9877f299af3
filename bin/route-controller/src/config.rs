//! Controller configuration
//!
//! Loaded from the YAML file named by `ROUTE_CONTROLLER_CONFIG` (if set), then
//! overridden by individual environment variables.

use anyhow::{bail, Context, Result};
use ipnetwork::IpNetwork;
use route_cloud::ApiClientConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ROUTE_CONTROLLER_CONFIG";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Cluster whose instances back the routes
    pub cluster_id: String,
    /// Pod address space of the cluster; only routes inside it are ever deleted
    pub cluster_cidr: String,
    /// Base URL of the VPC route table API
    pub vpc_endpoint: String,
    /// Base URL of the instance directory API
    pub instance_endpoint: String,
    /// Bearer token for both cloud APIs
    pub api_token: Option<String>,
    /// Seconds between reconciliation passes
    pub sync_interval_seconds: u64,
    /// Timeout for a single cloud API request
    pub request_timeout_seconds: u64,
    /// Listen address for /metrics and /healthz
    pub metrics_addr: SocketAddr,
    /// Reporting controller name on emitted events
    pub reporter: String,
    /// Emit logs as JSON
    pub json_logs: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cluster_id: String::new(),
            cluster_cidr: String::new(),
            vpc_endpoint: String::new(),
            instance_endpoint: String::new(),
            api_token: None,
            sync_interval_seconds: 30,
            request_timeout_seconds: 10,
            metrics_addr: ([0, 0, 0, 0], 9090).into(),
            reporter: "route-controller".to_string(),
            json_logs: false,
        }
    }
}

impl ControllerConfig {
    /// Load from the config file and process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_yaml(&raw).with_context(|| format!("Failed to parse config file {}", path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `ROUTE_*` overrides looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("ROUTE_CLUSTER_ID") {
            self.cluster_id = value;
        }
        if let Some(value) = lookup("ROUTE_CLUSTER_CIDR") {
            self.cluster_cidr = value;
        }
        if let Some(value) = lookup("ROUTE_VPC_ENDPOINT") {
            self.vpc_endpoint = value;
        }
        if let Some(value) = lookup("ROUTE_INSTANCE_ENDPOINT") {
            self.instance_endpoint = value;
        }
        if let Some(value) = lookup("ROUTE_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("ROUTE_SYNC_INTERVAL_SECONDS") {
            self.sync_interval_seconds = value
                .parse()
                .with_context(|| format!("Invalid ROUTE_SYNC_INTERVAL_SECONDS {:?}", value))?;
        }
        if let Some(value) = lookup("ROUTE_METRICS_ADDR") {
            self.metrics_addr = value
                .parse()
                .with_context(|| format!("Invalid ROUTE_METRICS_ADDR {:?}", value))?;
        }
        if let Some(value) = lookup("ROUTE_JSON_LOGS") {
            self.json_logs = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cluster_id.is_empty() {
            bail!("cluster_id must be set");
        }
        self.cluster_network()?;
        if self.vpc_endpoint.is_empty() {
            bail!("vpc_endpoint must be set");
        }
        if self.instance_endpoint.is_empty() {
            bail!("instance_endpoint must be set");
        }
        if self.sync_interval_seconds == 0 {
            bail!("sync_interval_seconds must be greater than zero");
        }
        Ok(())
    }

    /// The parsed cluster pod CIDR
    pub fn cluster_network(&self) -> Result<IpNetwork> {
        if self.cluster_cidr.is_empty() {
            bail!("cluster_cidr must be set");
        }
        self.cluster_cidr
            .parse()
            .with_context(|| format!("Invalid cluster_cidr {:?}", self.cluster_cidr))
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_seconds)
    }

    pub fn api_client_config(&self, endpoint: &str) -> ApiClientConfig {
        ApiClientConfig {
            endpoint: endpoint.to_string(),
            token: self.api_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}
