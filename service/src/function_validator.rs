//! Function Validator (§4.12): scans every property-ish leaf of the plan
//! for intrinsic-function literals and validates them structurally,
//! grounded in the original parser's `scan_properties` recursive walk.
//!
//! The scan is read-only: a function literal is never replaced in the
//! tree it's found in, so the round-trip invariant (§8 invariant 7) holds
//! without an explicit restore step.

use crate::Result;
use dsl_compiler_core::{
    function::{Function, FunctionInstance},
    types::Plan,
    LogicError,
};
use serde_json::Value;

#[tracing::instrument(skip_all)]
pub fn validate(plan: &Plan) -> Result<()> {
    for node in &plan.nodes {
        scan_map(plan, &node.properties)?;
        for rel in &node.relationships {
            scan_map(plan, &rel.properties)?;
        }
    }
    for group in plan.groups.values() {
        for policy in group.policies.values() {
            scan_map(plan, &policy.properties)?;
            for trigger in policy.triggers.values() {
                scan_map(plan, &trigger.parameters)?;
            }
        }
    }
    for workflow in plan.workflows.values() {
        scan_map(plan, &workflow.parameters)?;
    }
    for value in plan.outputs.values() {
        scan_value(plan, value)?;
    }
    Ok(())
}

fn scan_map(plan: &Plan, properties: &indexmap::IndexMap<String, Value>) -> Result<()> {
    for value in properties.values() {
        scan_value(plan, value)?;
    }
    Ok(())
}

fn scan_value(plan: &Plan, value: &Value) -> Result<()> {
    if let Some(function) = Function::try_parse(value) {
        let instance = FunctionInstance {
            function,
            raw: value.clone(),
        };
        return validate_function(plan, &instance);
    }
    match value {
        Value::Object(map) => {
            for v in map.values() {
                scan_value(plan, v)?;
            }
        }
        Value::Array(items) => {
            for v in items {
                scan_value(plan, v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_function(plan: &Plan, instance: &FunctionInstance) -> Result<()> {
    match &instance.function {
        Function::GetProperty { node_name, path } => {
            resolve_get_property(plan, node_name, path, &mut Vec::new())
        }
        // Deferred per the GLOSSARY: recognized but never evaluated at compile time.
        Function::GetAttribute { .. } => Ok(()),
        Function::GetInput { input_name } => {
            if plan.inputs.contains_key(input_name) {
                Ok(())
            } else {
                Err(LogicError::UndefinedInput {
                    input_name: input_name.clone(),
                }
                .into())
            }
        }
        Function::Concat { parts } => {
            for part in parts {
                scan_value(plan, part)?;
            }
            Ok(())
        }
        Function::Unregistered { args, .. } => scan_value(plan, args),
    }
}

/// Walks a `get_property` target chain, following nested `get_property`
/// results, until a non-function value or a dead end is reached.
/// `visiting` tracks `(node, path)` identities already on the current
/// chain; revisiting one is `LogicError::CircularGetProperty`.
fn resolve_get_property(
    plan: &Plan,
    node_name: &str,
    path: &[String],
    visiting: &mut Vec<(String, String)>,
) -> Result<()> {
    let identity = (node_name.to_string(), path.join("."));
    if visiting.iter().any(|seen| seen == &identity) {
        let mut chain: Vec<String> = visiting.iter().map(|(n, p)| format!("{n}.{p}")).collect();
        chain.push(format!("{}.{}", identity.0, identity.1));
        return Err(LogicError::CircularGetProperty(chain.join(" -> ")).into());
    }
    visiting.push(identity);

    if let (Some(node), Some(first)) = (plan.node(node_name), path.first()) {
        if let Some(mut value) = node.properties.get(first) {
            for segment in &path[1..] {
                match value.get(segment) {
                    Some(next) => value = next,
                    None => {
                        visiting.pop();
                        return Ok(());
                    }
                }
            }
            if let Some(Function::GetProperty {
                node_name: next_node,
                path: next_path,
            }) = Function::try_parse(value)
            {
                resolve_get_property(plan, &next_node, &next_path, visiting)?;
            }
        }
    }

    visiting.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsl_compiler_core::types::{BaseFamily, Instances, Node};
    use indexmap::IndexMap;
    use serde_json::json;

    fn plain_node(id: &str, properties: IndexMap<String, Value>) -> Node {
        Node {
            id: id.to_string(),
            type_name: "t".to_string(),
            declared_type: "t".to_string(),
            properties,
            relationships: Vec::new(),
            operations: IndexMap::new(),
            plugins: IndexMap::new(),
            instances: Instances::default(),
            type_hierarchy: vec!["t".to_string()],
            host_id: None,
            plugins_to_install: Vec::new(),
            deployment_plugins_to_install: Vec::new(),
        }
    }

    #[test]
    fn get_input_against_a_declared_input_passes() {
        let mut outputs = IndexMap::new();
        outputs.insert("out".to_string(), json!({"get_input": "x"}));
        let mut plan = Plan::default();
        plan.outputs = outputs;
        plan.inputs.insert(
            "x".to_string(),
            dsl_compiler_core::types::PropertyDefinition::default(),
        );
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn get_input_against_an_undeclared_input_fails() {
        let mut outputs = IndexMap::new();
        outputs.insert("out".to_string(), json!({"get_input": "ghost"}));
        let mut plan = Plan::default();
        plan.outputs = outputs;
        let err = validate(&plan).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Logic(LogicError::UndefinedInput { .. })
        ));
    }

    #[test]
    fn self_referential_get_property_is_a_cycle_error() {
        let mut props = IndexMap::new();
        props.insert("a".to_string(), json!({"get_property": ["n", "a"]}));
        let node = plain_node("n", props);
        let mut plan = Plan::default();
        plan.nodes.push(node);
        let err = validate(&plan).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CompileError::Logic(LogicError::CircularGetProperty(_))
        ));
    }

    #[test]
    fn get_attribute_is_never_evaluated() {
        let mut props = IndexMap::new();
        props.insert("a".to_string(), json!({"get_attribute": ["n", "ip"]}));
        let node = plain_node("n", props);
        let mut plan = Plan::default();
        plan.nodes.push(node);
        assert!(validate(&plan).is_ok());
    }

    #[test]
    fn base_family_default_is_not_disturbed_by_scanning() {
        // Scanning never mutates the plan; a relationship's base stays as set.
        let mut plan = Plan::default();
        plan.nodes.push(plain_node("n", IndexMap::new()));
        validate(&plan).unwrap();
        assert!(plan
            .nodes
            .first()
            .unwrap()
            .relationships
            .iter()
            .all(|r| r.base == BaseFamily::Undefined));
    }
}
