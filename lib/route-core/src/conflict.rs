//! Route table conflict detection
//!
//! Generated route rules and operator-created ones share a single VPC route
//! table. When their destinations overlap the operator's rule may shadow a pod
//! route (or the other way round). The detector reports such pairs as warning
//! events and never touches the route table.

use crate::events::{reasons, EventSink, EventSubject, Severity};
use crate::metrics::SyncMetrics;
use ipnetwork::IpNetwork;
use route_api::RouteRule;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of the description carried by every generated route rule
pub const GENERATED_DESCRIPTION_PREFIX: &str = "auto generated by route-controller";

/// Description written on rules created for `cluster_id`
pub fn generated_description(cluster_id: &str) -> String {
    format!("{}:{}", GENERATED_DESCRIPTION_PREFIX, cluster_id)
}

pub fn is_generated(rule: &RouteRule) -> bool {
    rule.description.contains(GENERATED_DESCRIPTION_PREFIX)
}

/// An operator rule overlapping a generated rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub other: RouteRule,
    pub generated: RouteRule,
}

#[derive(Clone)]
pub struct ConflictDetector {
    events: Arc<dyn EventSink>,
    metrics: SyncMetrics,
}

impl ConflictDetector {
    pub fn new(events: Arc<dyn EventSink>, metrics: SyncMetrics) -> Self {
        Self { events, metrics }
    }

    /// Scan a route table snapshot and emit one warning per conflicting pair
    pub async fn run(&self, rules: Vec<RouteRule>) -> usize {
        debug!(rules = rules.len(), "Starting route table conflict detection");
        let conflicts = find_conflicts(&rules);
        let subject = EventSubject::new("VPC", "RouteTableConflict");

        for conflict in &conflicts {
            let message = format!(
                "RouteTable conflict detected, custom routeRule {} ({}) may conflict with generated routeRule {} ({})",
                conflict.other.route_rule_id,
                conflict.other.destination_cidr,
                conflict.generated.route_rule_id,
                conflict.generated.destination_cidr,
            );
            warn!(
                other_rule = %conflict.other.route_rule_id,
                generated_rule = %conflict.generated.route_rule_id,
                "{}",
                message
            );
            self.metrics.route_conflicts_detected_total.inc();
            self.events
                .emit(
                    &subject,
                    Severity::Warning,
                    reasons::ROUTE_TABLE_CONFLICT_DETECTION,
                    message,
                )
                .await;
        }

        conflicts.len()
    }
}

/// Every (operator rule, generated rule) pair whose destinations overlap
pub fn find_conflicts(rules: &[RouteRule]) -> Vec<Conflict> {
    if rules.len() < 2 {
        return Vec::new();
    }

    let (generated, other): (Vec<&RouteRule>, Vec<&RouteRule>) =
        rules.iter().partition(|rule| is_generated(rule));
    if generated.is_empty() || other.is_empty() {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for other_rule in &other {
        for generated_rule in &generated {
            if is_conflict(other_rule, generated_rule) {
                conflicts.push(Conflict {
                    other: (*other_rule).clone(),
                    generated: (*generated_rule).clone(),
                });
            }
        }
    }
    conflicts
}

/// Whether the destinations of two rules intersect
///
/// Unparseable destinations cannot be judged and never conflict.
fn is_conflict(other: &RouteRule, generated: &RouteRule) -> bool {
    let generated_cidr = match parse_cidr(&generated.destination_cidr) {
        Some(cidr) => cidr,
        None => {
            debug!(rule = %generated.route_rule_id, cidr = %generated.destination_cidr, "Cannot parse generated rule destination");
            return false;
        }
    };
    let other_cidr = match parse_cidr(&other.destination_cidr) {
        Some(cidr) => cidr,
        None => {
            debug!(rule = %other.route_rule_id, cidr = %other.destination_cidr, "Cannot parse custom rule destination");
            return false;
        }
    };
    overlaps(&generated_cidr, &other_cidr)
}

fn parse_cidr(cidr: &str) -> Option<IpNetwork> {
    cidr.parse::<IpNetwork>().ok()
}

/// Two prefixes intersect exactly when one contains the other's network address
fn overlaps(a: &IpNetwork, b: &IpNetwork) -> bool {
    match (a, b) {
        (IpNetwork::V4(a), IpNetwork::V4(b)) => a.contains(b.network()) || b.contains(a.network()),
        (IpNetwork::V6(a), IpNetwork::V6(b)) => a.contains(b.network()) || b.contains(a.network()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEventSink;
    use route_api::NexthopType;

    fn rule(id: &str, dest: &str, generated: bool) -> RouteRule {
        RouteRule {
            route_rule_id: id.to_string(),
            route_table_id: "rt-1".to_string(),
            destination_cidr: dest.to_string(),
            source_cidr: "0.0.0.0/0".to_string(),
            nexthop_type: NexthopType::Custom,
            nexthop_id: "i-aaa".to_string(),
            description: if generated {
                generated_description("cluster-1")
            } else {
                "created by ops".to_string()
            },
        }
    }

    #[test]
    fn test_supernet_conflicts_once() {
        let rules = vec![rule("rr-gen", "10.0.0.0/8", true), rule("rr-ops", "10.1.0.0/16", false)];
        let conflicts = find_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].other.route_rule_id, "rr-ops");
        assert_eq!(conflicts[0].generated.route_rule_id, "rr-gen");
    }

    #[test]
    fn test_subnet_of_operator_rule_conflicts() {
        let rules = vec![rule("rr-gen", "10.1.2.0/24", true), rule("rr-ops", "10.0.0.0/8", false)];
        assert_eq!(find_conflicts(&rules).len(), 1);
    }

    #[test]
    fn test_disjoint_rules_do_not_conflict() {
        let rules = vec![rule("rr-gen", "10.0.0.0/8", true), rule("rr-ops", "192.168.0.0/16", false)];
        assert!(find_conflicts(&rules).is_empty());
    }

    #[test]
    fn test_identical_destinations_conflict() {
        let rules = vec![rule("rr-gen", "172.16.1.0/24", true), rule("rr-ops", "172.16.1.0/24", false)];
        assert_eq!(find_conflicts(&rules).len(), 1);
    }

    #[test]
    fn test_generated_rules_are_not_compared_with_each_other() {
        let rules = vec![rule("rr-a", "10.0.0.0/8", true), rule("rr-b", "10.1.0.0/16", true)];
        assert!(find_conflicts(&rules).is_empty());
    }

    #[test]
    fn test_unparseable_destination_is_skipped() {
        let rules = vec![
            rule("rr-gen", "10.0.0.0/8", true),
            rule("rr-bad", "not-a-cidr", false),
            rule("rr-ops", "10.2.0.0/16", false),
        ];
        let conflicts = find_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].other.route_rule_id, "rr-ops");
    }

    #[test]
    fn test_mixed_address_families_do_not_conflict() {
        let rules = vec![rule("rr-gen", "10.0.0.0/8", true), rule("rr-ops", "fd00::/8", false)];
        assert!(find_conflicts(&rules).is_empty());
    }

    #[test]
    fn test_single_rule_snapshot() {
        assert!(find_conflicts(&[rule("rr-gen", "10.0.0.0/8", true)]).is_empty());
        assert!(find_conflicts(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_run_emits_warning_per_conflict() {
        let sink = Arc::new(RecordingEventSink::default());
        let metrics = SyncMetrics::new().unwrap();
        let detector = ConflictDetector::new(sink.clone(), metrics.clone());

        let count = detector
            .run(vec![
                rule("rr-gen", "10.0.0.0/8", true),
                rule("rr-ops-1", "10.1.0.0/16", false),
                rule("rr-ops-2", "10.2.0.0/16", false),
                rule("rr-ops-3", "192.168.0.0/16", false),
            ])
            .await;
        assert_eq!(count, 2);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject, EventSubject::new("VPC", "RouteTableConflict"));
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].reason, reasons::ROUTE_TABLE_CONFLICT_DETECTION);
        assert!(events[0].message.contains("rr-ops-1"));
        assert!(events[0].message.contains("rr-gen"));
        assert_eq!(metrics.route_conflicts_detected_total.get(), 2);
    }
}
