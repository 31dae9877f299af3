use anyhow::{Context, Result};
use kube::Client;
use prometheus::Registry;
use route_cloud::{ApiClient, HttpInstanceDirectory, HttpRouteTableGateway};
use route_core::{RouteSynchronizer, SyncBackends, SyncMetrics};
use route_kube::{KubeEventSink, KubeNodeStore, NodeDiscovery};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod reconciler;
mod server;

use config::ControllerConfig;
use reconciler::RouteReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::load().context("Failed to load configuration")?;
    init_tracing(config.json_logs);

    info!(cluster = %config.cluster_id, "Starting route-controller...");

    let client = Client::try_default().await?;

    let registry = Registry::new();
    let metrics = SyncMetrics::register(&registry)?;

    let vpc_api = ApiClient::new(config.api_client_config(&config.vpc_endpoint))?;
    let instance_api = ApiClient::new(config.api_client_config(&config.instance_endpoint))?;

    let backends = SyncBackends {
        gateway: Arc::new(HttpRouteTableGateway::new(vpc_api)),
        directory: Arc::new(HttpInstanceDirectory::new(instance_api)),
        nodes: Arc::new(KubeNodeStore::new(client.clone())),
        events: Arc::new(KubeEventSink::new(client.clone(), &config.reporter)),
    };
    let sync = RouteSynchronizer::new(config.cluster_id.clone(), backends, metrics);
    let reconciler = RouteReconciler::new(
        sync,
        NodeDiscovery::new(client.clone()),
        config.cluster_id.clone(),
        config.cluster_network()?,
    );
    info!("Route synchronizer initialized, syncing every {:?}", config.sync_interval());

    let metrics_addr = config.metrics_addr;
    tokio::spawn(async move {
        if let Err(e) = server::serve(metrics_addr, registry).await {
            error!("Metrics server error: {}", e);
        }
    });

    let mut ticker = tokio::time::interval(config.sync_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = reconciler.reconcile().await {
                    warn!("Route reconciliation failed, retrying next interval: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting...");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
