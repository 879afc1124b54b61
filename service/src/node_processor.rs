//! Node Processor (§4.9): applies type implementations, merges property
//! schemas with instance values, processes relationships, and computes
//! `operations` by interface.

use crate::fs_adapter::ResourceFetcher;
use crate::plugin_binder::bind_operation;
use crate::type_resolver::{
    flatten_node_type, flatten_relationship_type, is_derived_from, relationship_is_derived_from,
    relationship_type_hierarchy,
};
use crate::Result;
use dsl_compiler_core::{
    merge::{merge_interfaces, merge_properties},
    types::{
        BaseFamily, Node, NodeTemplateRaw, NodeType, OpDescriptor, Plugin,
        RelationshipImplementation, RelationshipInstance, RelationshipTemplate, RelationshipType,
        TypeImplementation,
    },
    LogicError,
};
use indexmap::IndexMap;

pub struct NodeProcessor<'a> {
    pub node_types: &'a IndexMap<String, NodeType>,
    pub relationship_types: &'a IndexMap<String, RelationshipType>,
    pub plugins: &'a IndexMap<String, Plugin>,
    pub resources_base_url: Option<&'a str>,
    pub fetcher: &'a dyn ResourceFetcher,
}

impl<'a> NodeProcessor<'a> {
    /// Processes every entry of `node_templates`, consuming matched
    /// entries from `type_implementations` / `relationship_implementations`
    /// as it goes (§5: "the only mutation of an originally-imported structure").
    #[tracing::instrument(skip_all)]
    pub async fn process_all(
        &self,
        node_templates: &IndexMap<String, NodeTemplateRaw>,
        type_implementations: &mut IndexMap<String, TypeImplementation>,
        relationship_implementations: &mut IndexMap<String, RelationshipImplementation>,
    ) -> Result<Vec<Node>> {
        let node_names: Vec<&String> = node_templates.keys().collect();
        let mut nodes = Vec::with_capacity(node_templates.len());
        let mut deferred_target_plugins: IndexMap<String, IndexMap<String, Plugin>> = IndexMap::new();

        for (name, template) in node_templates {
            let node = self
                .process_node(
                    name,
                    template,
                    &node_names,
                    type_implementations,
                    relationship_implementations,
                    &mut deferred_target_plugins,
                )
                .await?;
            nodes.push(node);
        }

        for node in &mut nodes {
            if let Some(extra) = deferred_target_plugins.shift_remove(&node.id) {
                for (plugin_name, plugin) in extra {
                    node.plugins.entry(plugin_name).or_insert(plugin);
                }
            }
        }

        Ok(nodes)
    }

    #[tracing::instrument(skip_all, fields(node = %name))]
    async fn process_node(
        &self,
        name: &str,
        template: &NodeTemplateRaw,
        node_names: &[&String],
        type_implementations: &mut IndexMap<String, TypeImplementation>,
        relationship_implementations: &mut IndexMap<String, RelationshipImplementation>,
        deferred_target_plugins: &mut IndexMap<String, IndexMap<String, Plugin>>,
    ) -> Result<Node> {
        if !self.node_types.contains_key(&template.type_name) {
            return Err(LogicError::UndefinedNodeType {
                node_ref: name.to_string(),
                type_name: template.type_name.clone(),
            }
            .into());
        }

        // Step 2: TypeImplementation application.
        let matches: Vec<String> = type_implementations
            .iter()
            .filter(|(_, ti)| ti.node_ref == name)
            .map(|(k, _)| k.clone())
            .collect();
        if matches.len() > 1 {
            return Err(LogicError::MultipleTypeImplementations {
                node_ref: name.to_string(),
            }
            .into());
        }
        let (effective_type, overrides) = if let Some(impl_name) = matches.into_iter().next() {
            let ti = type_implementations.shift_remove(&impl_name).expect("just matched");
            if !is_derived_from(&ti.type_name, &template.type_name, self.node_types) {
                return Err(LogicError::TypeImplementationMismatch {
                    implementation: impl_name,
                    node_ref: name.to_string(),
                }
                .into());
            }
            (ti.type_name, ti.properties)
        } else {
            (template.type_name.clone(), IndexMap::new())
        };

        // Step 3: flatten the type and merge the template's interfaces.
        let flattened = flatten_node_type(&effective_type, self.node_types)?;
        let interfaces = merge_interfaces(&flattened.interfaces, &template.interfaces);

        // Step 4: property merge.
        let mut properties = merge_properties(&flattened.properties, &template.properties, &overrides)?;
        properties.insert("cloudify_runtime".to_string(), serde_json::json!({}));

        // Step 5: operation binding.
        let (operations, mut node_plugins) = self.bind_interfaces(&interfaces).await?;

        // Step 6: relationships. Plugins bound through a relationship's
        // source interfaces join this node's own plugins; plugins bound
        // through its target interfaces are deferred onto the target node,
        // which may not exist yet in this loop (§4.9/§4.10).
        let mut relationships = Vec::with_capacity(template.relationships.len());
        for rel in &template.relationships {
            let (instance, source_plugins) = self
                .process_relationship(name, rel, node_names, relationship_implementations, deferred_target_plugins)
                .await?;
            for (plugin_name, plugin) in source_plugins {
                node_plugins.entry(plugin_name).or_insert(plugin);
            }
            relationships.push(instance);
        }

        let type_hierarchy = crate::type_resolver::type_hierarchy(&effective_type, self.node_types);

        Ok(Node {
            id: name.to_string(),
            type_name: effective_type,
            declared_type: template.type_name.clone(),
            properties,
            relationships,
            operations,
            plugins: node_plugins,
            instances: template.instances.clone().unwrap_or_default(),
            type_hierarchy,
            host_id: None,
            plugins_to_install: Vec::new(),
            deployment_plugins_to_install: Vec::new(),
        })
    }

    /// Binds every operation of every interface to a plugin (§4.8),
    /// building both the short (`op_name`) and long (`interface.op_name`)
    /// entries of the node's `operations` map. Interfaces are iterated in
    /// sorted order (§9 open question) so a short-name collision between
    /// two interfaces is resolved deterministically: the short entry is
    /// dropped, long entries always remain.
    async fn bind_interfaces(
        &self,
        interfaces: &dsl_compiler_core::types::InterfaceMap,
    ) -> Result<(IndexMap<String, OpDescriptor>, IndexMap<String, Plugin>)> {
        let mut names: Vec<&String> = interfaces.keys().collect();
        names.sort();

        let mut operations = IndexMap::new();
        let mut short_name_owner: IndexMap<String, String> = IndexMap::new();
        let mut node_plugins = IndexMap::new();

        for interface_name in names {
            let ops = &interfaces[interface_name];
            let mut op_names: Vec<&String> = ops.keys().collect();
            op_names.sort();
            for op_name in op_names {
                let spec = &ops[op_name];
                let descriptor = bind_operation(
                    spec.mapping(),
                    spec.parameters(),
                    self.plugins,
                    false,
                    self.resources_base_url,
                    self.fetcher,
                    7,
                )
                .await?;

                if !descriptor.plugin.is_empty() {
                    if let Some(plugin) = self.plugins.get(&descriptor.plugin) {
                        node_plugins.insert(descriptor.plugin.clone(), plugin.clone());
                    }
                }

                let long_name = format!("{interface_name}.{op_name}");
                operations.insert(long_name, descriptor.clone());

                if let Some(owner) = short_name_owner.get(op_name) {
                    if owner != interface_name {
                        operations.shift_remove(op_name);
                    }
                } else {
                    short_name_owner.insert(op_name.clone(), interface_name.clone());
                    operations.insert(op_name.clone(), descriptor);
                }
            }
        }

        Ok((operations, node_plugins))
    }

    async fn process_relationship(
        &self,
        source: &str,
        rel: &RelationshipTemplate,
        node_names: &[&String],
        relationship_implementations: &mut IndexMap<String, RelationshipImplementation>,
        deferred_target_plugins: &mut IndexMap<String, IndexMap<String, Plugin>>,
    ) -> Result<(RelationshipInstance, IndexMap<String, Plugin>)> {
        if rel.target == source {
            return Err(LogicError::SelfTargetingRelationship {
                node_ref: source.to_string(),
            }
            .into());
        }
        if !node_names.iter().any(|n| n.as_str() == rel.target) {
            return Err(LogicError::UnknownRelationshipTarget {
                source_node_ref: source.to_string(),
                target: rel.target.clone(),
            }
            .into());
        }

        let matches: Vec<String> = relationship_implementations
            .iter()
            .filter(|(_, ri)| ri.source_node_ref == source && ri.target_node_ref == rel.target)
            .map(|(k, _)| k.clone())
            .collect();
        if matches.len() > 1 {
            return Err(LogicError::MultipleRelationshipImplementations {
                source_node_ref: source.to_string(),
                target_node_ref: rel.target.clone(),
            }
            .into());
        }
        let (effective_type, overrides) = if let Some(impl_name) = matches.into_iter().next() {
            let ri = relationship_implementations
                .shift_remove(&impl_name)
                .expect("just matched");
            if !relationship_is_derived_from(&ri.type_name, &rel.type_name, self.relationship_types) {
                return Err(LogicError::RelationshipImplementationMismatch {
                    implementation: impl_name,
                }
                .into());
            }
            (ri.type_name, ri.properties)
        } else {
            (rel.type_name.clone(), IndexMap::new())
        };

        if !self.relationship_types.contains_key(&effective_type) {
            return Err(LogicError::UndefinedRelationshipType {
                source_node_ref: source.to_string(),
                relationship_type: effective_type,
            }
            .into());
        }

        let flattened = flatten_relationship_type(&effective_type, self.relationship_types)?;
        let source_interfaces = merge_interfaces(&flattened.source_interfaces, &rel.source_interfaces);
        let target_interfaces = merge_interfaces(&flattened.target_interfaces, &rel.target_interfaces);
        let properties = merge_properties(&flattened.properties, &rel.properties, &overrides)?;

        let (source_operations, source_plugins) = self.bind_interfaces(&source_interfaces).await?;
        let (target_operations, target_plugins) = self.bind_interfaces(&target_interfaces).await?;

        if !target_plugins.is_empty() {
            let entry = deferred_target_plugins.entry(rel.target.clone()).or_default();
            for (plugin_name, plugin) in target_plugins {
                entry.entry(plugin_name).or_insert(plugin);
            }
        }

        let type_hierarchy = relationship_type_hierarchy(&effective_type, self.relationship_types);

        Ok((
            RelationshipInstance {
                type_name: effective_type,
                target_id: rel.target.clone(),
                source_operations,
                target_operations,
                source_interfaces,
                target_interfaces,
                properties,
                type_hierarchy,
                base: BaseFamily::Undefined,
                state: "reachable".to_string(),
            },
            source_plugins,
        ))
    }
}
