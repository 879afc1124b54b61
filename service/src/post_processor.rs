//! Post-processor (§4.10): classifies relationships by base family,
//! derives `host_id`, and aggregates `plugins_to_install` /
//! `deployment_plugins_to_install`.

use crate::type_resolver::{is_derived_from, relationship_is_derived_from};
use crate::Result;
use dsl_compiler_core::{
    constants::{BASE_FAMILY_ROOTS, HOST_TYPE},
    types::{BaseFamily, Executor, Node, NodeType, RelationshipImplementation, RelationshipType, TypeImplementation},
    LogicError,
};
use indexmap::IndexMap;
use std::collections::HashMap;

#[tracing::instrument(skip_all)]
pub fn post_process(
    nodes: &mut [Node],
    node_types: &IndexMap<String, NodeType>,
    relationship_types: &IndexMap<String, RelationshipType>,
    leftover_type_implementations: &IndexMap<String, TypeImplementation>,
    leftover_relationship_implementations: &IndexMap<String, RelationshipImplementation>,
) -> Result<()> {
    classify_relationship_bases(nodes, relationship_types)?;
    derive_host_ids(nodes, node_types)?;
    aggregate_plugins(nodes)?;

    if let Some((name, ti)) = leftover_type_implementations.iter().next() {
        return Err(LogicError::UnusedTypeImplementation {
            implementation: name.clone(),
            node_ref: ti.node_ref.clone(),
        }
        .into());
    }
    if let Some((name, _)) = leftover_relationship_implementations.iter().next() {
        return Err(LogicError::UnusedRelationshipImplementation {
            implementation: name.clone(),
        }
        .into());
    }

    Ok(())
}

fn classify_relationship_bases(
    nodes: &mut [Node],
    relationship_types: &IndexMap<String, RelationshipType>,
) -> Result<()> {
    for node in nodes.iter_mut() {
        let mut contained_count = 0;
        for rel in &mut node.relationships {
            rel.base = BASE_FAMILY_ROOTS
                .iter()
                .find(|(root, _)| relationship_is_derived_from(&rel.type_name, root, relationship_types))
                .map(|(_, family)| *family)
                .unwrap_or(BaseFamily::Undefined);
            if rel.base == BaseFamily::Contained {
                contained_count += 1;
            }
        }
        if contained_count > 1 {
            return Err(LogicError::MultipleContainingRelationships {
                node_ref: node.id.clone(),
            }
            .into());
        }
    }
    Ok(())
}

fn derive_host_ids(nodes: &mut [Node], node_types: &IndexMap<String, NodeType>) -> Result<()> {
    let contained_in_target: HashMap<String, String> = nodes
        .iter()
        .filter_map(|n| {
            n.relationships
                .iter()
                .find(|r| r.base == BaseFamily::Contained)
                .map(|r| (n.id.clone(), r.target_id.clone()))
        })
        .collect();
    let is_host: HashMap<String, bool> = nodes
        .iter()
        .map(|n| (n.id.clone(), is_derived_from(&n.type_name, HOST_TYPE, node_types)))
        .collect();

    let mut resolved: HashMap<String, Option<String>> = HashMap::new();
    let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    for id in &ids {
        resolve_host_id(id, &contained_in_target, &is_host, &mut resolved, &mut Vec::new());
    }

    for node in nodes.iter_mut() {
        node.host_id = resolved.get(&node.id).cloned().flatten();
    }
    Ok(())
}

fn resolve_host_id(
    id: &str,
    contained_in_target: &HashMap<String, String>,
    is_host: &HashMap<String, bool>,
    resolved: &mut HashMap<String, Option<String>>,
    visiting: &mut Vec<String>,
) -> Option<String> {
    if let Some(cached) = resolved.get(id) {
        return cached.clone();
    }
    if visiting.contains(&id.to_string()) {
        // A contained-in cycle; no host is reachable. A conformant
        // document never produces one (it would also fail invariant 2).
        resolved.insert(id.to_string(), None);
        return None;
    }
    visiting.push(id.to_string());

    let result = if *is_host.get(id).unwrap_or(&false) {
        Some(id.to_string())
    } else {
        contained_in_target
            .get(id)
            .and_then(|target| resolve_host_id(target, contained_in_target, is_host, resolved, visiting))
    };

    visiting.pop();
    resolved.insert(id.to_string(), result.clone());
    result
}

fn aggregate_plugins(nodes: &mut [Node]) -> Result<()> {
    let mut per_host: HashMap<String, IndexMap<String, ()>> = HashMap::new();
    for node in nodes.iter() {
        if let Some(host_id) = &node.host_id {
            let entry = per_host.entry(host_id.clone()).or_default();
            for (name, plugin) in &node.plugins {
                if plugin.executor == Executor::HostAgent {
                    entry.insert(name.clone(), ());
                }
            }
        } else {
            for (_, plugin) in &node.plugins {
                if plugin.executor == Executor::HostAgent {
                    return Err(LogicError::HostAgentPluginOnNonContained {
                        node_ref: node.id.clone(),
                    }
                    .into());
                }
            }
        }
    }

    for node in nodes.iter_mut() {
        node.deployment_plugins_to_install = node
            .plugins
            .iter()
            .filter(|(_, p)| p.executor == Executor::CentralDeploymentAgent)
            .map(|(name, _)| name.clone())
            .collect();
    }

    for node in nodes.iter_mut() {
        let Some(host_id) = &node.host_id else { continue };
        if host_id != &node.id {
            continue;
        }
        node.plugins_to_install = per_host
            .get(host_id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
    }

    Ok(())
}
