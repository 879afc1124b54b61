//! Pure merge helpers with no I/O dependency: the property-schema merge
//! law (§4.9.4, invariant 8 in §8) and the interface merge rule (§4.7.1).
//! Both are exercised by the Type Resolver and Node Processor in the
//! `service` crate, and are kept here so they can be property-tested in
//! isolation from the rest of the pipeline.

use crate::error::LogicError;
use crate::types::{InterfaceMap, OperationSpec, PropertyDefinition};
use indexmap::IndexMap;
use serde_json::Value;

/// `R[k] = V[k] ?? O[k] ?? S[k].default`, for every `k` in the schema `S`.
/// Any key in `values` or `overrides` that is not in `schema` is an error;
/// any mandatory key (`PropertyDefinition::is_mandatory`) absent from both
/// `values` and `overrides` is an error.
pub fn merge_properties(
    schema: &IndexMap<String, PropertyDefinition>,
    values: &IndexMap<String, Value>,
    overrides: &IndexMap<String, Value>,
) -> Result<IndexMap<String, Value>, LogicError> {
    for key in values.keys().chain(overrides.keys()) {
        if !schema.contains_key(key) {
            return Err(LogicError::PropertyNotInSchema { key: key.clone() });
        }
    }

    let mut result = IndexMap::with_capacity(schema.len());
    for (key, def) in schema {
        let resolved = values
            .get(key)
            .or_else(|| overrides.get(key))
            .cloned()
            .or_else(|| def.default.clone());

        match resolved {
            Some(value) => {
                result.insert(key.clone(), value);
            }
            None => {
                return Err(LogicError::PropertyMissingValue { key: key.clone() });
            }
        }
    }
    Ok(result)
}

/// Merges parent interfaces `parent` into child interfaces `child`, the
/// rule used identically for type-inheritance flattening, template-onto-type
/// binding, and relationship-instance-onto-type binding (§4.7.1): the
/// result key set is `keys(parent) ∪ keys(child)`; for a shared interface,
/// per-operation the child wins but parent-only operations are inherited.
///
/// Interface names are iterated in sorted order so the result never
/// depends on the caller's map insertion order (§9 open question: the
/// short-name collision rule must be deterministic).
pub fn merge_interfaces(parent: &InterfaceMap, child: &InterfaceMap) -> InterfaceMap {
    let mut names: Vec<&String> = parent.keys().chain(child.keys()).collect();
    names.sort();
    names.dedup();

    let mut result = InterfaceMap::new();
    for name in names {
        let mut ops: IndexMap<String, OperationSpec> = IndexMap::new();
        if let Some(parent_ops) = parent.get(name) {
            ops.extend(parent_ops.clone());
        }
        if let Some(child_ops) = child.get(name) {
            for (op_name, spec) in child_ops {
                ops.insert(op_name.clone(), spec.clone());
            }
        }
        result.insert(name.clone(), ops);
    }
    result
}

/// Sub-dict merge of two property schemas for type-inheritance flattening:
/// parent keys are added unless the child overrides the same key.
pub fn merge_property_schemas(
    parent: &IndexMap<String, PropertyDefinition>,
    child: &IndexMap<String, PropertyDefinition>,
) -> IndexMap<String, PropertyDefinition> {
    let mut result = parent.clone();
    for (key, def) in child {
        result.insert(key.clone(), def.clone());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(default: Option<Value>) -> PropertyDefinition {
        PropertyDefinition {
            default,
            ..Default::default()
        }
    }

    #[test]
    fn value_wins_over_override_and_default() {
        let schema = IndexMap::from([("p".to_string(), def(Some(json!(1))))]);
        let values = IndexMap::from([("p".to_string(), json!(2))]);
        let overrides = IndexMap::from([("p".to_string(), json!(3))]);
        let result = merge_properties(&schema, &values, &overrides).unwrap();
        assert_eq!(result["p"], json!(2));
    }

    #[test]
    fn override_wins_over_default_when_no_value() {
        let schema = IndexMap::from([("p".to_string(), def(Some(json!(1))))]);
        let overrides = IndexMap::from([("p".to_string(), json!(3))]);
        let result = merge_properties(&schema, &IndexMap::new(), &overrides).unwrap();
        assert_eq!(result["p"], json!(3));
    }

    #[test]
    fn default_used_when_nothing_else_provided() {
        let schema = IndexMap::from([("p".to_string(), def(Some(json!(1))))]);
        let result = merge_properties(&schema, &IndexMap::new(), &IndexMap::new()).unwrap();
        assert_eq!(result["p"], json!(1));
    }

    #[test]
    fn mandatory_key_without_value_is_an_error() {
        let schema = IndexMap::from([("p".to_string(), def(None))]);
        let err = merge_properties(&schema, &IndexMap::new(), &IndexMap::new()).unwrap_err();
        assert!(matches!(err, LogicError::PropertyMissingValue { .. }));
    }

    #[test]
    fn unknown_key_in_values_is_an_error() {
        let schema: IndexMap<String, PropertyDefinition> = IndexMap::new();
        let values = IndexMap::from([("p".to_string(), json!(1))]);
        let err = merge_properties(&schema, &values, &IndexMap::new()).unwrap_err();
        assert!(matches!(err, LogicError::PropertyNotInSchema { .. }));
    }

    #[test]
    fn interface_merge_inherits_parent_only_ops_and_child_wins_shared() {
        let mut parent = InterfaceMap::new();
        parent.insert(
            "lifecycle".to_string(),
            IndexMap::from([
                ("create".to_string(), OperationSpec::Mapping("a.create".into())),
                ("start".to_string(), OperationSpec::Mapping("a.start".into())),
            ]),
        );
        let mut child = InterfaceMap::new();
        child.insert(
            "lifecycle".to_string(),
            IndexMap::from([(
                "start".to_string(),
                OperationSpec::Mapping("b.start".into()),
            )]),
        );

        let merged = merge_interfaces(&parent, &child);
        let lifecycle = &merged["lifecycle"];
        assert_eq!(lifecycle["create"], OperationSpec::Mapping("a.create".into()));
        assert_eq!(lifecycle["start"], OperationSpec::Mapping("b.start".into()));
    }
}
