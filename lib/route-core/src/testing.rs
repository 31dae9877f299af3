//! In-memory collaborators for engine tests

use crate::cloud::{InstanceDirectory, RouteTableGateway};
use crate::events::{EventSink, EventSubject, Severity};
use crate::node::NodeMetadataStore;
use crate::{Result, RouteError};
use async_trait::async_trait;
use route_api::{
    CreateRouteRuleArgs, Instance, InstanceStatus, NexthopType, NodeName, RouteRule,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

pub const VPC_ID: &str = "vpc-test";
pub const ROUTE_TABLE_ID: &str = "rt-test";

pub fn instance(id: &str, address: &str, status: InstanceStatus) -> Instance {
    Instance {
        instance_id: id.to_string(),
        internal_address: address.to_string(),
        vpc_id: VPC_ID.to_string(),
        subnet_id: "sbn-test".to_string(),
        status,
    }
}

pub fn custom_rule(id: &str, dest: &str, nexthop_id: &str, description: &str) -> RouteRule {
    RouteRule {
        route_rule_id: id.to_string(),
        route_table_id: ROUTE_TABLE_ID.to_string(),
        destination_cidr: dest.to_string(),
        source_cidr: "0.0.0.0/0".to_string(),
        nexthop_type: NexthopType::Custom,
        nexthop_id: nexthop_id.to_string(),
        description: description.to_string(),
    }
}

/// The NAT rule every test VPC starts with
pub fn system_rule() -> RouteRule {
    RouteRule {
        route_rule_id: "rr-system".to_string(),
        route_table_id: ROUTE_TABLE_ID.to_string(),
        destination_cidr: "192.168.100.0/24".to_string(),
        source_cidr: "0.0.0.0/0".to_string(),
        nexthop_type: NexthopType::Nat,
        nexthop_id: "nat-1".to_string(),
        description: "system".to_string(),
    }
}

#[derive(Default)]
struct CloudState {
    rules: Vec<RouteRule>,
    instances: Vec<Instance>,
    next_rule: u32,
    instance_lists: usize,
    fail_deletes: bool,
    fail_route_table: bool,
    fail_instance_lists: bool,
}

/// Route table and instance directory of a single VPC
#[derive(Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&self, rule: RouteRule) {
        self.state.lock().unwrap().rules.push(rule);
    }

    pub fn add_instance(&self, instance: Instance) {
        self.state.lock().unwrap().instances.push(instance);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.state.lock().unwrap().fail_deletes = fail;
    }

    pub fn set_fail_route_table(&self, fail: bool) {
        self.state.lock().unwrap().fail_route_table = fail;
    }

    pub fn set_fail_instance_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_instance_lists = fail;
    }

    pub fn rules(&self) -> Vec<RouteRule> {
        self.state.lock().unwrap().rules.clone()
    }

    pub fn rules_for(&self, dest: &str) -> Vec<RouteRule> {
        self.rules()
            .into_iter()
            .filter(|rule| rule.destination_cidr == dest)
            .collect()
    }

    pub fn instance_lists(&self) -> usize {
        self.state.lock().unwrap().instance_lists
    }
}

#[async_trait]
impl RouteTableGateway for FakeCloud {
    async fn list_route_table(&self, vpc_id: &str) -> Result<Vec<RouteRule>> {
        if vpc_id != VPC_ID {
            return Err(RouteError::transport(format!("unknown vpc {}", vpc_id)));
        }
        let state = self.state.lock().unwrap();
        if state.fail_route_table {
            return Err(RouteError::transport("route table unavailable"));
        }
        Ok(state.rules.clone())
    }

    async fn create_route_rule(&self, args: &CreateRouteRuleArgs) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.next_rule += 1;
        let id = format!("rr-new-{}", state.next_rule);
        state.rules.push(RouteRule {
            route_rule_id: id.clone(),
            route_table_id: args.route_table_id.clone(),
            destination_cidr: args.destination_cidr.clone(),
            source_cidr: args.source_cidr.clone(),
            nexthop_type: args.nexthop_type,
            nexthop_id: args.nexthop_id.clone(),
            description: args.description.clone(),
        });
        Ok(id)
    }

    async fn delete_route_rule(&self, route_rule_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes {
            return Err(RouteError::transport("delete rejected"));
        }
        state.rules.retain(|rule| rule.route_rule_id != route_rule_id);
        Ok(())
    }
}

#[async_trait]
impl InstanceDirectory for FakeCloud {
    async fn list_instances(&self, _cluster_id: &str) -> Result<Vec<Instance>> {
        let mut state = self.state.lock().unwrap();
        state.instance_lists += 1;
        if state.fail_instance_lists {
            return Err(RouteError::transport("instance directory unavailable"));
        }
        Ok(state.instances.clone())
    }
}

#[derive(Default)]
struct NodeState {
    nodes: HashMap<NodeName, BTreeMap<String, String>>,
    patches: usize,
    fail_patches: bool,
}

/// Node annotations keyed by node name
#[derive(Default)]
pub struct FakeNodeStore {
    state: Mutex<NodeState>,
}

impl FakeNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(NodeName::new(name), BTreeMap::new());
    }

    pub fn set_annotation(&self, name: &str, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .entry(NodeName::new(name))
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn annotation(&self, name: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(&NodeName::new(name))
            .and_then(|annotations| annotations.get(key).cloned())
    }

    pub fn set_fail_patches(&self, fail: bool) {
        self.state.lock().unwrap().fail_patches = fail;
    }

    pub fn patches(&self) -> usize {
        self.state.lock().unwrap().patches
    }
}

#[async_trait]
impl NodeMetadataStore for FakeNodeStore {
    async fn get_annotations(&self, node: &NodeName) -> Result<BTreeMap<String, String>> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(node)
            .cloned()
            .ok_or_else(|| RouteError::NodeNotFound(node.clone()))
    }

    async fn patch_annotations(
        &self,
        node: &NodeName,
        annotations: BTreeMap<String, String>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_patches {
            return Err(RouteError::transport("patch rejected"));
        }
        let stored = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| RouteError::NodeNotFound(node.clone()))?;
        stored.extend(annotations);
        state.patches += 1;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    pub subject: EventSubject,
    pub severity: Severity,
    pub reason: String,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, subject: &EventSubject, severity: Severity, reason: &str, message: String) {
        self.events.lock().unwrap().push(RecordedEvent {
            subject: subject.clone(),
            severity,
            reason: reason.to_string(),
            message,
        });
    }
}
