//! Loader (§4.2): parses YAML bytes into a generic tree. The YAML
//! tokenizer itself is an external collaborator (`spec.md §1`); this
//! module states its contract as "bytes in, `serde_json::Value` tree
//! out" by parsing through `serde_yaml`'s `serde_json::Value` bridge,
//! which lets every later stage (especially the Schema Validator, §4.6)
//! work against a real `jsonschema`-compatible tree instead of a
//! YAML-specific one.

use crate::error::{CompileError, Result};
use dsl_compiler_core::{constants::DSL_DEFINITIONS_KEY, FormatError};
use serde_json::Value;

/// Parses `text` into a tree; a `null` top-level document becomes an
/// empty mapping (§4.2) and any `dsl_definitions` section is dropped
/// immediately, since it exists only to hold YAML anchors/aliases and is
/// never read again (§C.2 of `SPEC_FULL.md`).
#[tracing::instrument(skip(text))]
pub fn load(text: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| CompileError::Format(FormatError::YamlParse(e.to_string())))?;

    let mut value = match value {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    if let Some(obj) = value.as_object_mut() {
        obj.remove(DSL_DEFINITIONS_KEY);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_becomes_empty_mapping() {
        let v = load("").unwrap();
        assert_eq!(v, Value::Object(serde_json::Map::new()));
    }

    #[test]
    fn dsl_definitions_is_stripped() {
        let v = load("dsl_definitions:\n  x: &x 1\nfoo: 1\n").unwrap();
        assert!(v.get("dsl_definitions").is_none());
        assert_eq!(v.get("foo"), Some(&Value::from(1)));
    }

    #[test]
    fn invalid_yaml_is_a_format_error() {
        let err = load("foo: [").unwrap_err();
        assert!(matches!(err, CompileError::Format(FormatError::YamlParse(_))));
    }
}
