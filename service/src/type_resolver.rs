//! Type Resolver (§4.7): recursively flattens `derived_from` chains for
//! node types and relationship types, merging `properties` schemas and
//! interfaces per the Interface Merge Rule (§4.7.1).

use crate::Result;
use dsl_compiler_core::{
    merge::{merge_interfaces, merge_property_schemas},
    types::{NodeType, RelationshipType},
    LogicError,
};
use indexmap::IndexMap;
use std::collections::HashSet;

/// `flatten(type_name, container, merge_fn)` for node types.
pub fn flatten_node_type(
    name: &str,
    types: &IndexMap<String, NodeType>,
) -> Result<NodeType> {
    let mut visiting = HashSet::new();
    flatten_node_type_inner(name, types, &mut visiting)
}

fn flatten_node_type_inner(
    name: &str,
    types: &IndexMap<String, NodeType>,
    visiting: &mut HashSet<String>,
) -> Result<NodeType> {
    let ty = types.get(name).ok_or_else(|| LogicError::UndefinedNodeType {
        node_ref: name.to_string(),
        type_name: name.to_string(),
    })?;

    let Some(parent_name) = &ty.derived_from else {
        return Ok(ty.clone());
    };

    if !visiting.insert(name.to_string()) {
        return Err(LogicError::CyclicTypeHierarchy {
            type_name: name.to_string(),
        }
        .into());
    }
    let parent = flatten_node_type_inner(parent_name, types, visiting)?;
    visiting.remove(name);

    Ok(NodeType {
        derived_from: ty.derived_from.clone(),
        properties: merge_property_schemas(&parent.properties, &ty.properties),
        interfaces: merge_interfaces(&parent.interfaces, &ty.interfaces),
    })
}

/// Same recursion for relationship types; both `source_interfaces` and
/// `target_interfaces` are merged (§4.7).
pub fn flatten_relationship_type(
    name: &str,
    types: &IndexMap<String, RelationshipType>,
) -> Result<RelationshipType> {
    let mut visiting = HashSet::new();
    flatten_relationship_type_inner(name, types, &mut visiting)
}

fn flatten_relationship_type_inner(
    name: &str,
    types: &IndexMap<String, RelationshipType>,
    visiting: &mut HashSet<String>,
) -> Result<RelationshipType> {
    let ty = types
        .get(name)
        .ok_or_else(|| LogicError::UndefinedRelationshipType {
            source_node_ref: String::new(),
            relationship_type: name.to_string(),
        })?;

    let Some(parent_name) = &ty.derived_from else {
        return Ok(ty.clone());
    };

    if !visiting.insert(name.to_string()) {
        return Err(LogicError::CyclicTypeHierarchy {
            type_name: name.to_string(),
        }
        .into());
    }
    let parent = flatten_relationship_type_inner(parent_name, types, visiting)?;
    visiting.remove(name);

    Ok(RelationshipType {
        derived_from: ty.derived_from.clone(),
        properties: merge_property_schemas(&parent.properties, &ty.properties),
        source_interfaces: merge_interfaces(&parent.source_interfaces, &ty.source_interfaces),
        target_interfaces: merge_interfaces(&parent.target_interfaces, &ty.target_interfaces),
    })
}

/// Root-first `type_hierarchy` for a type name already known to resolve
/// (§4.10): walks `derived_from` to the root then reverses.
pub fn type_hierarchy(
    name: &str,
    types: &IndexMap<String, NodeType>,
) -> Vec<String> {
    let mut chain = vec![name.to_string()];
    let mut current = name;
    while let Some(parent) = types.get(current).and_then(|t| t.derived_from.as_deref()) {
        chain.push(parent.to_string());
        current = parent;
    }
    chain.reverse();
    chain
}

/// Same walk for relationship types.
pub fn relationship_type_hierarchy(
    name: &str,
    types: &IndexMap<String, RelationshipType>,
) -> Vec<String> {
    let mut chain = vec![name.to_string()];
    let mut current = name;
    while let Some(parent) = types.get(current).and_then(|t| t.derived_from.as_deref()) {
        chain.push(parent.to_string());
        current = parent;
    }
    chain.reverse();
    chain
}

/// `true` if `name`'s `derived_from` chain reaches `ancestor` (inclusive).
pub fn is_derived_from(
    name: &str,
    ancestor: &str,
    types: &IndexMap<String, NodeType>,
) -> bool {
    let mut current = Some(name.to_string());
    while let Some(n) = current {
        if n == ancestor {
            return true;
        }
        current = types.get(&n).and_then(|t| t.derived_from.clone());
    }
    false
}

/// Same ancestry check for relationship types.
pub fn relationship_is_derived_from(
    name: &str,
    ancestor: &str,
    types: &IndexMap<String, RelationshipType>,
) -> bool {
    let mut current = Some(name.to_string());
    while let Some(n) = current {
        if n == ancestor {
            return true;
        }
        current = types.get(&n).and_then(|t| t.derived_from.clone());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsl_compiler_core::types::PropertyDefinition;
    use serde_json::json;

    fn node_type(derived_from: Option<&str>, prop: Option<(&str, i64)>) -> NodeType {
        let mut properties = IndexMap::new();
        if let Some((key, default)) = prop {
            properties.insert(
                key.to_string(),
                PropertyDefinition {
                    default: Some(json!(default)),
                    ..Default::default()
                },
            );
        }
        NodeType {
            derived_from: derived_from.map(str::to_string),
            properties,
            interfaces: IndexMap::new(),
        }
    }

    #[test]
    fn flattening_inherits_parent_properties() {
        let mut types = IndexMap::new();
        types.insert("parent".to_string(), node_type(None, Some(("p1", 1))));
        types.insert("child".to_string(), node_type(Some("parent"), Some(("p2", 2))));

        let flat = flatten_node_type("child", &types).unwrap();
        assert_eq!(flat.properties.len(), 2);
        assert_eq!(flat.properties["p1"].default, Some(json!(1)));
    }

    #[test]
    fn child_overrides_parent_property_of_same_name() {
        let mut types = IndexMap::new();
        types.insert("parent".to_string(), node_type(None, Some(("p", 1))));
        types.insert("child".to_string(), node_type(Some("parent"), Some(("p", 2))));

        let flat = flatten_node_type("child", &types).unwrap();
        assert_eq!(flat.properties["p"].default, Some(json!(2)));
    }

    #[test]
    fn self_referential_derived_from_is_a_cycle_error() {
        let mut types = IndexMap::new();
        types.insert("a".to_string(), node_type(Some("a"), None));
        let err = flatten_node_type("a", &types).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Logic(dsl_compiler_core::LogicError::CyclicTypeHierarchy { .. })
        ));
    }

    #[test]
    fn type_hierarchy_is_root_first() {
        let mut types = IndexMap::new();
        types.insert("a".to_string(), node_type(None, None));
        types.insert("b".to_string(), node_type(Some("a"), None));
        types.insert("c".to_string(), node_type(Some("b"), None));
        assert_eq!(type_hierarchy("c", &types), vec!["a", "b", "c"]);
    }

    fn chain(names: &[String]) -> IndexMap<String, NodeType> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let parent = if i + 1 < names.len() {
                    Some(names[i + 1].clone())
                } else {
                    None
                };
                (name.clone(), node_type(parent.as_deref(), None))
            })
            .collect()
    }

    proptest::proptest! {
        /// A strictly acyclic `derived_from` chain of any length always flattens
        /// (invariant 6, §8), regardless of its length.
        #[test]
        fn acyclic_chain_of_any_length_resolves(len in 1usize..12) {
            let names: Vec<String> = (0..len).map(|i| format!("t{i}")).collect();
            let types = chain(&names);
            proptest::prop_assert!(flatten_node_type(&names[0], &types).is_ok());
        }

        /// Closing the chain's tail back onto any earlier link is always a
        /// cycle error, never a stack overflow or a silently wrong result.
        #[test]
        fn closing_the_chain_anywhere_is_always_a_cycle_error(
            len in 2usize..10,
            close_at in 0usize..10,
        ) {
            let close_at = close_at % len;
            let names: Vec<String> = (0..len).map(|i| format!("t{i}")).collect();
            let mut types = chain(&names);
            types.get_mut(names.last().unwrap()).unwrap().derived_from =
                Some(names[close_at].clone());

            let err = flatten_node_type(&names[0], &types).unwrap_err();
            let is_cyclic = matches!(
                err,
                crate::error::CompileError::Logic(LogicError::CyclicTypeHierarchy { .. })
            );
            proptest::prop_assert!(is_cyclic);
        }
    }
}
