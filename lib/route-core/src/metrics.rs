//! Prometheus metrics for route synchronization

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

/// Counters describing what the route engine did to the VPC and the nodes
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct SyncMetrics {
    /// Route rules created in the VPC
    pub route_rules_created_total: IntCounter,
    /// Route rules deleted from the VPC, stale ones included
    pub route_rules_deleted_total: IntCounter,
    /// Generated/operator rule pairs found overlapping
    pub route_conflicts_detected_total: IntCounter,
    /// Failed public operations by operation name
    pub route_sync_errors_total: IntCounterVec,
    /// Annotation patches issued against nodes
    pub route_annotation_patches_total: IntCounter,
    /// Routes returned by the last list call
    pub routes_listed: IntGauge,
}

impl SyncMetrics {
    /// Create unregistered metrics
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            route_rules_created_total: IntCounter::new(
                "route_rules_created_total",
                "Total VPC route rules created",
            )?,
            route_rules_deleted_total: IntCounter::new(
                "route_rules_deleted_total",
                "Total VPC route rules deleted",
            )?,
            route_conflicts_detected_total: IntCounter::new(
                "route_conflicts_detected_total",
                "Total route table conflicts detected",
            )?,
            route_sync_errors_total: IntCounterVec::new(
                Opts::new("route_sync_errors_total", "Total failed route operations"),
                &["operation"],
            )?,
            route_annotation_patches_total: IntCounter::new(
                "route_annotation_patches_total",
                "Total node annotation patches issued",
            )?,
            routes_listed: IntGauge::new("routes_listed", "Routes returned by the last list")?,
        })
    }

    /// Create metrics and register them on `registry`
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let metrics = Self::new()?;
        registry.register(Box::new(metrics.route_rules_created_total.clone()))?;
        registry.register(Box::new(metrics.route_rules_deleted_total.clone()))?;
        registry.register(Box::new(metrics.route_conflicts_detected_total.clone()))?;
        registry.register(Box::new(metrics.route_sync_errors_total.clone()))?;
        registry.register(Box::new(metrics.route_annotation_patches_total.clone()))?;
        registry.register(Box::new(metrics.routes_listed.clone()))?;
        Ok(metrics)
    }

    pub(crate) fn record_error(&self, operation: &str) {
        self.route_sync_errors_total
            .with_label_values(&[operation])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_exposes_metrics() {
        let registry = Registry::new();
        let metrics = SyncMetrics::register(&registry).unwrap();
        metrics.route_rules_created_total.inc();
        metrics.record_error("create_route");

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"route_rules_created_total".to_string()));
        assert!(names.contains(&"route_sync_errors_total".to_string()));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        SyncMetrics::register(&registry).unwrap();
        assert!(SyncMetrics::register(&registry).is_err());
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = SyncMetrics::new().unwrap();
        let clone = metrics.clone();
        clone.route_rules_deleted_total.inc();
        assert_eq!(metrics.route_rules_deleted_total.get(), 1);
    }
}
