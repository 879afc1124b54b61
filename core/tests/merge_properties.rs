//! Property-based tests for the merge law in `core::merge`, exercising
//! the invariants `SPEC_FULL.md` §B commits to beyond the fixed-example
//! unit tests already living next to the implementation.

use dsl_compiler_core::merge::merge_properties;
use dsl_compiler_core::types::PropertyDefinition;
use indexmap::IndexMap;
use proptest::prelude::*;
use serde_json::{json, Value};

fn schema_with_default(keys: &[String]) -> IndexMap<String, PropertyDefinition> {
    keys.iter()
        .map(|k| {
            (
                k.clone(),
                PropertyDefinition {
                    default: Some(json!(0)),
                    ..Default::default()
                },
            )
        })
        .collect()
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

proptest! {
    /// When every schema key has a default, the merge always succeeds and
    /// its result has exactly the schema's key set, regardless of which
    /// subset of those keys `values`/`overrides` happen to supply.
    #[test]
    fn result_key_set_equals_schema_key_set(
        keys in prop::collection::hash_set(key_strategy(), 1..8),
        value_subset in prop::collection::hash_set(key_strategy(), 0..8),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let schema = schema_with_default(&keys);

        let values: IndexMap<String, Value> = keys
            .iter()
            .filter(|k| value_subset.contains(*k))
            .map(|k| (k.clone(), json!(1)))
            .collect();

        let result = merge_properties(&schema, &values, &IndexMap::new()).unwrap();
        let mut result_keys: Vec<&String> = result.keys().collect();
        let mut schema_keys: Vec<&String> = schema.keys().collect();
        result_keys.sort();
        schema_keys.sort();
        prop_assert_eq!(result_keys, schema_keys);
    }

    /// A key present in `values` always wins over the schema default, no
    /// matter what `overrides` says for that same key.
    #[test]
    fn explicit_value_always_wins_over_default_and_override(
        key in key_strategy(),
        value in 0i64..1000,
        override_value in 0i64..1000,
    ) {
        let schema = schema_with_default(&[key.clone()]);
        let values = IndexMap::from([(key.clone(), json!(value))]);
        let overrides = IndexMap::from([(key.clone(), json!(override_value))]);

        let result = merge_properties(&schema, &values, &overrides).unwrap();
        prop_assert_eq!(result[&key].clone(), json!(value));
    }

    /// Any key absent from the schema makes the whole merge fail, whether
    /// it arrived via `values` or `overrides`.
    #[test]
    fn key_outside_schema_is_always_rejected(
        known in key_strategy(),
        unknown in key_strategy(),
    ) {
        prop_assume!(known != unknown);
        let schema = schema_with_default(&[known]);
        let values = IndexMap::from([(unknown, json!(1))]);
        prop_assert!(merge_properties(&schema, &values, &IndexMap::new()).is_err());
    }
}
