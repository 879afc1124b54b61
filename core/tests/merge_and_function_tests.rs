//! Integration tests exercising the core crate's pure helpers from
//! outside the crate, the way a downstream pipeline stage would.

use dsl_compiler_core::function::Function;
use dsl_compiler_core::merge::{merge_interfaces, merge_properties};
use dsl_compiler_core::types::{InterfaceMap, OperationSpec, PropertyDefinition};
use indexmap::IndexMap;
use serde_json::json;

#[test]
fn property_merge_prefers_instance_value_over_schema_default() {
    let mut schema = IndexMap::new();
    schema.insert(
        "replicas".to_string(),
        PropertyDefinition {
            default: Some(json!(1)),
            ..Default::default()
        },
    );
    let mut values = IndexMap::new();
    values.insert("replicas".to_string(), json!(3));

    let merged = merge_properties(&schema, &values, &IndexMap::new()).unwrap();
    assert_eq!(merged["replicas"], json!(3));
}

#[test]
fn property_merge_rejects_keys_outside_the_schema() {
    let schema: IndexMap<String, PropertyDefinition> = IndexMap::new();
    let mut values = IndexMap::new();
    values.insert("unknown".to_string(), json!(1));

    assert!(merge_properties(&schema, &values, &IndexMap::new()).is_err());
}

#[test]
fn interface_merge_is_a_union_with_child_precedence() {
    let mut parent: InterfaceMap = InterfaceMap::new();
    parent.insert(
        "lifecycle".to_string(),
        IndexMap::from([("create".to_string(), OperationSpec::Mapping("a.create".into()))]),
    );
    let mut child: InterfaceMap = InterfaceMap::new();
    child.insert(
        "monitor".to_string(),
        IndexMap::from([("poll".to_string(), OperationSpec::Mapping("b.poll".into()))]),
    );

    let merged = merge_interfaces(&parent, &child);
    assert!(merged.contains_key("lifecycle"));
    assert!(merged.contains_key("monitor"));
}

#[test]
fn get_input_with_a_single_element_array_form_parses() {
    let f = Function::try_parse(&json!({"get_input": ["threshold"]})).unwrap();
    assert_eq!(
        f,
        Function::GetInput {
            input_name: "threshold".to_string()
        }
    );
}

#[test]
fn concat_collects_its_parts_unevaluated() {
    let f = Function::try_parse(&json!({"concat": ["a", {"get_input": "x"}]})).unwrap();
    match f {
        Function::Concat { parts } => assert_eq!(parts.len(), 2),
        _ => panic!("expected Concat"),
    }
}
