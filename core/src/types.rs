//! The data model produced by the compiler pipeline.
//!
//! Entities are keyed mappings; relationships between entities are by
//! name reference (a sibling map key), never by ownership, so the whole
//! tree can be represented without cycles even though the blueprint
//! graph it describes is cyclic-capable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A property-schema entry: `{default?, required?, type?}` plus any
/// extra schema keys the DSL allows through unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyDefinition {
    pub default: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PropertyDefinition {
    /// A key with no `default` and `required` not explicitly `false` is mandatory.
    pub fn is_mandatory(&self) -> bool {
        self.default.is_none() && self.required != Some(false)
    }
}

/// `interfaces{name -> {op -> mapping_or_spec}}`, shared shape for node
/// types, relationship types, node templates and relationship instances.
pub type InterfaceMap = IndexMap<String, IndexMap<String, OperationSpec>>;

/// An operation mapping: either the bare `"plugin.op"` string form or
/// the expanded `{implementation|mapping, inputs|parameters}` spec.
/// Field names differ between node operations (`implementation`/`inputs`)
/// and workflows (`mapping`/`parameters`); both are accepted on read and
/// normalized to `mapping`/`parameters` internally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OperationSpec {
    Mapping(String),
    Spec {
        #[serde(alias = "implementation")]
        mapping: String,
        #[serde(alias = "inputs", default)]
        parameters: IndexMap<String, Value>,
    },
}

impl OperationSpec {
    pub fn mapping(&self) -> &str {
        match self {
            Self::Mapping(m) => m,
            Self::Spec { mapping, .. } => mapping,
        }
    }

    pub fn parameters(&self) -> IndexMap<String, Value> {
        match self {
            Self::Mapping(_) => IndexMap::new(),
            Self::Spec { parameters, .. } => parameters.clone(),
        }
    }
}

/// A flattened, plugin-bound operation, the output of the Plugin Binder (§4.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OpDescriptor {
    pub plugin: String,
    pub operation: String,
    #[serde(default)]
    pub inputs: IndexMap<String, Value>,
}

/// §3 `NodeType`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeType {
    pub derived_from: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDefinition>,
    #[serde(default)]
    pub interfaces: InterfaceMap,
}

/// §3 `RelationshipType`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipType {
    pub derived_from: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDefinition>,
    #[serde(default)]
    pub source_interfaces: InterfaceMap,
    #[serde(default)]
    pub target_interfaces: InterfaceMap,
}

/// §3 `Plugin`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Executor {
    #[serde(rename = "host_agent")]
    HostAgent,
    #[serde(rename = "central_deployment_agent")]
    CentralDeploymentAgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub executor: Executor,
    pub source: Option<String>,
    #[serde(default = "default_true")]
    pub install: bool,
}

fn default_true() -> bool {
    true
}

/// §3 `TypeImplementation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeImplementation {
    #[serde(rename = "type")]
    pub type_name: String,
    pub node_ref: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// §3 `RelationshipImplementation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipImplementation {
    #[serde(rename = "type")]
    pub type_name: String,
    pub source_node_ref: String,
    pub target_node_ref: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// Unprocessed relationship instance as it appears on a `node_templates` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipTemplate {
    #[serde(rename = "type")]
    pub type_name: String,
    pub target: String,
    #[serde(default)]
    pub source_interfaces: InterfaceMap,
    #[serde(default)]
    pub target_interfaces: InterfaceMap,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// §3 `NodeTemplate` as it appears in `node_templates`, before the Node
/// Processor runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplateRaw {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub relationships: Vec<RelationshipTemplate>,
    #[serde(default)]
    pub interfaces: InterfaceMap,
    pub instances: Option<Instances>,
}

/// §3 `RelationshipInstance`, the processed form living on a `Node`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipInstance {
    #[serde(rename = "type")]
    pub type_name: String,
    pub target_id: String,
    pub source_operations: IndexMap<String, OpDescriptor>,
    pub target_operations: IndexMap<String, OpDescriptor>,
    pub source_interfaces: InterfaceMap,
    pub target_interfaces: InterfaceMap,
    pub properties: IndexMap<String, Value>,
    pub type_hierarchy: Vec<String>,
    pub base: BaseFamily,
    pub state: String,
}

/// One of the three well-known relationship roots a relationship derives
/// from, or `Undefined` if it derives from none of them (§4.10).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BaseFamily {
    Contained,
    Connected,
    Depends,
    Undefined,
}

/// Deployment instance count, `node.instances`, defaulting to `{deploy: 1}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instances {
    pub deploy: u64,
}

impl Default for Instances {
    fn default() -> Self {
        Self { deploy: 1 }
    }
}

/// §3 `NodeTemplate` after the Node Processor and Post-processor have run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub declared_type: String,
    pub properties: IndexMap<String, Value>,
    pub relationships: Vec<RelationshipInstance>,
    pub operations: IndexMap<String, OpDescriptor>,
    pub plugins: IndexMap<String, Plugin>,
    pub instances: Instances,
    pub type_hierarchy: Vec<String>,
    pub host_id: Option<String>,
    pub plugins_to_install: Vec<String>,
    pub deployment_plugins_to_install: Vec<String>,
}

/// §3 `PolicyType` / `PolicyTrigger` share a shape: a single property schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyType {
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyTrigger {
    #[serde(default)]
    pub parameters: IndexMap<String, PropertyDefinition>,
}

/// A policy bound to a group, after property-merge (§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub triggers: IndexMap<String, Trigger>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

/// §3 `Group`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub members: Vec<String>,
    #[serde(default)]
    pub policies: IndexMap<String, Policy>,
}

/// A processed workflow: its mapping bound to a plugin the same way a
/// node operation is (§4.8), but keyed by `mapping`/`parameters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub plugin: String,
    pub operation: String,
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
}

/// The compiled deployment plan, §3 `Plan`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub nodes: Vec<Node>,
    pub relationships: IndexMap<String, RelationshipType>,
    pub workflows: IndexMap<String, Workflow>,
    pub policy_types: IndexMap<String, PolicyType>,
    pub policy_triggers: IndexMap<String, PolicyTrigger>,
    pub groups: IndexMap<String, Group>,
    pub inputs: IndexMap<String, PropertyDefinition>,
    pub outputs: IndexMap<String, Value>,
    pub deployment_plugins_to_install: Vec<String>,
    pub workflow_plugins_to_install: Vec<String>,
    pub version: String,
}

impl Plan {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
